// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context implementations.
//!
//! Contexts implement the adapters the slip manager reads and writes through.
//! Currently, there's only one context implementation available, the
//! [`memory::InMemoryContext`], which keeps everything in memory and is meant
//! for testing and development.
pub mod memory;
