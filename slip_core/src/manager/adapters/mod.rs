// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context adapters for the slip manager.
//!
//! Each adapter is implemented by the user of the library on top of their
//! own storage and image reading stack. Multi-entity writes
//! ([`SlipCommit`], [`AdminReview`]) must be atomic: either every mutation
//! lands or none does.

mod commit;
mod order;
mod slip_reader;
mod transaction;
mod verification;

pub use commit::*;
pub use order::*;
pub use slip_reader::SlipReader;
pub use transaction::*;
pub use verification::*;
