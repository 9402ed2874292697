// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Slip Checks
//!
//! Checks run on a slip once it has been matched to an order and its amount
//! has been confirmed. They are supplied by the lib user and can refuse a
//! slip before the payment is committed.
//!
//! ## Example
//!
//! ```rust
//! # use std::sync::Arc;
//! use slip_receipt::{
//!     checks::{Check, CheckResult, SlipCheck},
//!     state::Matched,
//!     Context, SlipWithState,
//! };
//! # use async_trait::async_trait;
//!
//! struct MyCheck;
//!
//! #[async_trait]
//! impl Check for MyCheck {
//!     async fn check(&self, ctx: &Context, slip: &SlipWithState<Matched>) -> CheckResult {
//!         // Implement your check here
//!         Ok(())
//!     }
//! }
//!
//! let my_check: SlipCheck = Arc::new(MyCheck);
//! ```

use std::{ops::Deref, sync::Arc};

use crate::{state::Matched, Confidence, Context, SlipWithState};

/// SlipCheck is a type alias for an Arc of a struct that implements the `Check` trait.
pub type SlipCheck = Arc<dyn Check + Sync + Send>;

/// Result of a check operation. It uses the `anyhow` crate to handle errors.
pub type CheckResult = Result<(), CheckError>;

#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    /// The check could not complete, the slip may be submitted again
    #[error(transparent)]
    Retryable(anyhow::Error),
    /// The slip is refused
    #[error(transparent)]
    Failed(anyhow::Error),
}

/// CheckList is a NewType pattern to store a list of checks.
/// It is a wrapper around an Arc of SlipCheck[].
#[derive(Clone)]
pub struct CheckList(Arc<[SlipCheck]>);

impl CheckList {
    pub fn new(checks: Vec<SlipCheck>) -> Self {
        Self(checks.into())
    }

    pub fn empty() -> Self {
        Self(Arc::new([]))
    }
}

impl From<Vec<SlipCheck>> for CheckList {
    fn from(checks: Vec<SlipCheck>) -> Self {
        Self::new(checks)
    }
}

impl Default for CheckList {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for CheckList {
    type Target = [SlipCheck];

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Check trait is implemented by the lib user to validate slips before the
/// payment is committed.
#[async_trait::async_trait]
pub trait Check {
    async fn check(&self, ctx: &Context, slip: &SlipWithState<Matched>) -> CheckResult;
}

/// Refuses slips whose EMVCo payload does not carry a valid CRC.
///
/// Not part of the default pipeline: bank apps re-render payloads and a
/// damaged checksum is common on photographed slips.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChecksumCheck;

#[async_trait::async_trait]
impl Check for ChecksumCheck {
    async fn check(&self, _: &Context, slip: &SlipWithState<Matched>) -> CheckResult {
        match slip.observation().qr_checksum_valid {
            Some(true) => Ok(()),
            Some(false) => Err(CheckError::Failed(anyhow::anyhow!(
                "QR payload checksum does not match"
            ))),
            None => Err(CheckError::Failed(anyhow::anyhow!(
                "QR payload carries no checksum"
            ))),
        }
    }
}

/// Refuses slips whose QR and OCR reading is below the given confidence.
#[derive(Debug, Clone, Copy)]
pub struct MinimumConfidenceCheck(pub Confidence);

#[async_trait::async_trait]
impl Check for MinimumConfidenceCheck {
    async fn check(&self, _: &Context, slip: &SlipWithState<Matched>) -> CheckResult {
        let confidence = slip.observation().confidence;
        if confidence < self.0 {
            return Err(CheckError::Failed(anyhow::anyhow!(
                "slip confidence {confidence} is below {}",
                self.0
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{extraction::Reconciler, state::Scanned, Rejection, SlipScan};

    fn d(amount: &str) -> Decimal {
        amount.parse().unwrap()
    }

    fn matched(qr_text: String, ocr_text: Option<&str>) -> SlipWithState<Matched> {
        let scan = SlipScan::new(Some(qr_text), ocr_text.map(str::to_owned));
        let slip: SlipWithState<Scanned> =
            SlipWithState::new(Reconciler::default().reconcile(&scan));
        slip.into_matched("ORD-7".to_owned(), d("99.99"))
    }

    fn payload() -> String {
        promptpay_qr::encode("ORD-7", Some(d("99.99"))).unwrap()
    }

    /// References refused by [`BlockedReferenceCheck`]
    struct Blocklist(Vec<String>);

    struct BlockedReferenceCheck;

    #[async_trait::async_trait]
    impl Check for BlockedReferenceCheck {
        async fn check(&self, ctx: &Context, slip: &SlipWithState<Matched>) -> CheckResult {
            let Some(blocklist) = ctx.get::<Blocklist>() else {
                return Err(CheckError::Retryable(anyhow::anyhow!("blocklist unavailable")));
            };
            let reference = slip.observation().qr_reference.clone().unwrap_or_default();
            if blocklist.0.contains(&reference) {
                return Err(CheckError::Failed(
                    Rejection::DuplicateTransaction { reference }.into(),
                ));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn empty_check_list_passes() {
        let slip = matched(payload(), None);
        let checked = slip
            .finalize_checks(&Context::new(), &CheckList::empty())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(checked.order().order_id, "ORD-7");
    }

    #[tokio::test]
    async fn checksum_check_refuses_tampered_payload() {
        let tampered = payload().replace("99.99", "10.00");
        let checks = CheckList::new(vec![Arc::new(ChecksumCheck)]);

        let rejected = matched(tampered, None)
            .finalize_checks(&Context::new(), &checks)
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(
            rejected.rejection(),
            Rejection::CheckFailure { reason } if reason.contains("checksum")
        ));
    }

    #[tokio::test]
    async fn confidence_check_requires_agreeing_ocr() {
        let checks = CheckList::new(vec![Arc::new(MinimumConfidenceCheck(Confidence::High))]);
        let ctx = Context::new();

        let rejected = matched(payload(), None)
            .finalize_checks(&ctx, &checks)
            .await
            .unwrap();
        assert!(rejected.is_err());

        let accepted = matched(payload(), Some("จำนวน 99.99 บาท"))
            .finalize_checks(&ctx, &checks)
            .await
            .unwrap();
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn user_check_reads_context() {
        let checks = CheckList::new(vec![Arc::new(BlockedReferenceCheck)]);

        let retry = matched(payload(), None)
            .finalize_checks(&Context::new(), &checks)
            .await;
        assert_eq!(retry.unwrap_err(), "blocklist unavailable");

        let mut ctx = Context::new();
        ctx.insert(Blocklist(vec!["ORD-7".to_owned()]));
        let rejected = matched(payload(), None)
            .finalize_checks(&ctx, &checks)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(
            rejected.rejection(),
            &Rejection::DuplicateTransaction {
                reference: "ORD-7".to_owned()
            }
        );
    }
}
