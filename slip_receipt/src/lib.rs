// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Slip observations, states and checks
//!
//! A transfer slip uploaded by a customer is read by an external image
//! collaborator into a [`SlipScan`]: the raw text of its QR code and the raw
//! OCR text, either of which may be missing. The [`extraction::Reconciler`]
//! merges both into a [`SlipObservation`].
//!
//! The observation is then wrapped into a state machine that follows the slip
//! through verification:
//! - `Scanned`: The slip has been read but not matched to an order.
//! - `Matched`: An order has been resolved for the slip.
//! - `Checked`: The slip passed every check and can be committed.
//! - `Rejected`: The slip failed a check, see [`Rejection`].
//!
pub mod checks;
mod error;
pub mod extraction;
mod slip;
pub mod state;

pub use error::Rejection;
pub use extraction::{Confidence, SlipObservation};
use serde::{Deserialize, Serialize};
pub use slip::{ResultSlip, SlipWithState};

/// Extra information for [checks::Check]
pub type Context = anymap3::Map<dyn std::any::Any + Send + Sync>;

/// Raw output of the image collaborator for one slip image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipScan {
    /// Decoded QR symbol text, if a QR code was found
    pub qr_text: Option<String>,
    /// OCR text, if OCR is available and succeeded
    pub ocr_text: Option<String>,
}

impl SlipScan {
    pub fn new(qr_text: Option<String>, ocr_text: Option<String>) -> Self {
        Self { qr_text, ocr_text }
    }
}
