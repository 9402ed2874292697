// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use slip_receipt::{Confidence, SlipObservation};

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
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
    ManualReview,
    ApprovedByAdmin,
}

impl VerificationStatus {
    /// Returns whether a record may move from `self` to `next`.
    ///
    /// Only `Pending -> *` is taken by the pipeline; the rest are admin
    /// actions. A rejected record may be rejected again by an admin.
    pub fn can_transition_to(self, next: VerificationStatus) -> bool {
        use VerificationStatus::*;
        matches!(
            (self, next),
            (Pending, Verified | Rejected | ManualReview)
                | (Verified | Rejected, ManualReview | ApprovedByAdmin | Rejected)
                | (ManualReview, ApprovedByAdmin | Rejected)
        )
    }
}

/// Audit entry for one slip submission. Records are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub transaction_id: Option<u64>,
    pub order_id: Option<String>,
    pub qr_found: bool,
    pub qr_payload: Option<String>,
    pub qr_amount: Option<Decimal>,
    pub qr_reference: Option<String>,
    pub ocr_text: Option<String>,
    pub ocr_amount: Option<Decimal>,
    pub ocr_reference: Option<String>,
    /// QR amount equals the order amount exactly
    pub amounts_match: bool,
    pub amount_difference: Option<Decimal>,
    pub order_amount: Option<Decimal>,
    pub status: VerificationStatus,
    pub confidence: Option<Confidence>,
    pub rejection_reason: Option<String>,
    /// Admin who decided on this record; a record is decided at most once
    pub reviewed_by: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// Creates a pending record carrying both extraction sources of `observation`.
    pub fn from_observation(observation: &SlipObservation, created_at: DateTime<Utc>) -> Self {
        Self {
            transaction_id: None,
            order_id: None,
            qr_found: observation.qr_found,
            qr_payload: observation.qr_payload.clone(),
            qr_amount: observation.qr_amount,
            qr_reference: observation.qr_reference.clone(),
            ocr_text: observation.ocr_text.clone(),
            ocr_amount: observation.ocr_amount,
            ocr_reference: observation.ocr_reference.clone(),
            amounts_match: false,
            amount_difference: None,
            order_amount: None,
            status: VerificationStatus::Pending,
            confidence: Some(observation.confidence),
            rejection_reason: None,
            reviewed_by: None,
            admin_notes: None,
            created_at,
            verified_at: None,
            updated_at: created_at,
        }
    }

    pub fn is_reviewed(&self) -> bool {
        self.reviewed_by.is_some()
    }
}
