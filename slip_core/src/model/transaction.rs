// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionStatus {
    /// Announced by a bank notification, no slip seen yet
    PendingSlip,
    Matched,
    Verified,
    Failed,
}

impl TransactionStatus {
    /// Returns whether a transaction may move from `self` to `next`.
    ///
    /// `Failed -> Verified` is only legal while no other live transaction
    /// holds the same reference, which stores check separately.
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (PendingSlip, Matched | Verified | Failed)
                | (Matched, Verified | Failed)
                | (Verified, Failed)
                | (Failed, Verified)
        )
    }

    /// A live transaction holds its reference exclusively.
    pub fn holds_reference(self) -> bool {
        self != TransactionStatus::Failed
    }
}

/// A bank transfer, identified by the reference the bank or QR carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: String,
    pub amount: Decimal,
    pub bank_id: Option<String>,
    pub status: TransactionStatus,
    /// Order this transfer pays
    pub order_id: Option<String>,
    /// Raw bank notification text
    pub notification_text: Option<String>,
    /// File name of the uploaded slip image
    pub slip_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        reference: impl Into<String>,
        amount: Decimal,
        status: TransactionStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reference: reference.into(),
            amount,
            bank_id: None,
            status,
            order_id: None,
            notification_text: None,
            slip_name: None,
            created_at,
            updated_at: created_at,
        }
    }
}
