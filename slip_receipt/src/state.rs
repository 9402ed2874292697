// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Slip State
//!
//! These are the implementation of the typestate pattern for tracking the
//! state of a slip during verification.
//! The `SlipState` trait represents the different states a slip can be in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Rejection;

/// The order a slip has been matched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMatch {
    pub order_id: String,
    /// Stored (disambiguated) order amount
    pub order_amount: Decimal,
}

/// Scanned state represents a slip read by QR and OCR, not yet matched.
#[derive(Debug, Clone)]
pub struct Scanned;

/// Matched state represents a slip resolved to a pending order.
#[derive(Debug, Clone)]
pub struct Matched(pub OrderMatch);

/// Checked state represents a slip that passed every check.
#[derive(Debug, Clone)]
pub struct Checked(pub OrderMatch);

/// Rejected state represents a slip that failed a check.
#[derive(Debug, Clone)]
pub struct Rejected {
    pub rejection: Rejection,
}

/// Trait for the different states a slip can be in.
pub trait SlipState {}
impl SlipState for Scanned {}
impl SlipState for Matched {}
impl SlipState for Checked {}
impl SlipState for Rejected {}
