// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The `manager` module is the primary interface of the merchant receiving
//! PromptPay transfers.
//!
//! The [`Manager`] creates orders with disambiguated amounts, verifies
//! uploaded slips against them, records bank notifications and applies admin
//! decisions. The checks run on every matched slip are supplied by the user
//! as a [`slip_receipt::checks::CheckList`].
//!
//! The `Manager` reads and writes through user-defined adapters (see
//! [adapters]), so it runs on top of any storage and image reading stack.

pub mod adapters;
#[cfg(feature = "in_memory")]
pub mod context;
mod slip_manager;

pub use slip_manager::Manager;
