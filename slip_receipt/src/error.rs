// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reason a slip was refused by the verification pipeline.
///
/// These are expected business outcomes, reported to the caller as values.
#[derive(
    thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    #[error("QR code not found in slip image")]
    QrNotFound,
    #[error("could not extract amount from QR code")]
    AmountExtractionFailed,
    #[error("no order found matching amount {qr_amount} exactly")]
    NoMatchingOrder {
        qr_amount: Decimal,
        order_id: Option<String>,
    },
    #[error("amount mismatch: expected {expected} but slip shows {received} (difference {difference})")]
    AmountMismatch {
        expected: Decimal,
        received: Decimal,
        difference: Decimal,
    },
    #[error("transaction {reference} has already been used")]
    DuplicateTransaction { reference: String },
    #[error("check failed: {reason}")]
    CheckFailure { reason: String },
}

impl Rejection {
    /// Stable snake_case name of the rejection kind.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
