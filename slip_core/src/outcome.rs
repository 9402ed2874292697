// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Inputs and results of the [`crate::manager::Manager`] operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use slip_receipt::{Confidence, Rejection, SlipObservation};

use crate::model::{Order, Stored, Transaction, VerificationRecord};

/// Payment request handed back to the customer for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub order_id: String,
    /// Disambiguated amount the customer must transfer
    pub final_amount: Decimal,
    /// Wire payload to render as a QR code
    pub payload: String,
    pub created_at: DateTime<Utc>,
    /// `false` when the order already existed
    pub created: bool,
}

/// A slip image uploaded by a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlipUpload {
    pub image: Vec<u8>,
    pub file_name: Option<String>,
    /// Order the customer claims to pay, if known
    pub order_id: Option<String>,
}

impl SlipUpload {
    pub fn new(image: impl Into<Vec<u8>>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    /// The order, now completed
    pub order: Order,
    pub transaction_id: u64,
    pub verification_id: u64,
    pub reference: String,
    pub confidence: Confidence,
    pub observation: SlipObservation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedSlip {
    pub rejection: Rejection,
    pub observation: SlipObservation,
    /// Audit record, stored only when no order matched
    pub verification: Option<u64>,
}

/// Terminal result of verifying one slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SlipVerdict {
    Verified(VerifiedPayment),
    Rejected(RejectedSlip),
}

impl SlipVerdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, SlipVerdict::Verified(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            SlipVerdict::Verified(_) => None,
            SlipVerdict::Rejected(rejected) => Some(&rejected.rejection),
        }
    }

    pub fn observation(&self) -> &SlipObservation {
        match self {
            SlipVerdict::Verified(verified) => &verified.observation,
            SlipVerdict::Rejected(rejected) => &rejected.observation,
        }
    }
}

/// An admin approving or rejecting a verification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDecision {
    pub verification_id: u64,
    pub approve: bool,
    pub notes: Option<String>,
    /// Identity of the deciding admin
    pub admin: String,
}

/// Entities as left by an applied [`AdminDecision`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedPayment {
    pub verification: Stored<VerificationRecord>,
    pub transaction: Option<Stored<Transaction>>,
    pub order: Option<Order>,
}
