// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Module containing a slip observation with the state tracking it through
//! verification.
//!
//! Every transition consumes the slip, so a slip rejected by one step cannot
//! reach a later one.

use rust_decimal::Decimal;

use crate::{
    checks::{CheckError, SlipCheck},
    state::{Checked, Matched, OrderMatch, Rejected, Scanned, SlipState},
    Context, Rejection, SlipObservation,
};

pub type ResultSlip<S> = std::result::Result<SlipWithState<S>, SlipWithState<Rejected>>;

/// Typestate pattern for tracking the state of a slip
///
/// - The [ `SlipState` ] trait represents the different states a slip can
///   be in.
/// - The [ `Scanned` ] state is a slip observed but not yet matched.
/// - The [ `Matched` ] state is a slip resolved to an order.
/// - The [ `Checked` ] state is a slip that passed every check.
/// - The [ `Rejected` ] state is a slip refused with a [`Rejection`].
#[derive(Debug, Clone)]
pub struct SlipWithState<S>
where
    S: SlipState,
{
    pub(crate) observation: SlipObservation,
    pub(crate) state: S,
}

impl SlipWithState<Scanned> {
    /// Creates a new `SlipWithState` in the `Scanned` state
    pub fn new(observation: SlipObservation) -> SlipWithState<Scanned> {
        SlipWithState {
            observation,
            state: Scanned,
        }
    }

    /// Returns the QR amount used to resolve the order.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::QrNotFound`] when no QR payload was read and
    /// [`Rejection::AmountExtractionFailed`] when the payload has no amount.
    pub fn qr_amount(&self) -> Result<Decimal, Rejection> {
        if !self.observation.qr_found {
            return Err(Rejection::QrNotFound);
        }
        self.observation
            .qr_amount
            .ok_or(Rejection::AmountExtractionFailed)
    }

    /// Attaches the resolved order to the slip
    pub fn into_matched(self, order_id: String, order_amount: Decimal) -> SlipWithState<Matched> {
        self.perform_state_changes(Matched(OrderMatch {
            order_id,
            order_amount,
        }))
    }
}

impl SlipWithState<Matched> {
    pub fn order(&self) -> &OrderMatch {
        &self.state.0
    }

    /// Absolute difference between the order amount and the QR amount.
    pub fn amount_difference(&self) -> Decimal {
        let qr_amount = self.observation.qr_amount.unwrap_or_default();
        (self.state.0.order_amount - qr_amount).abs()
    }

    /// Requires the QR amount to equal the order amount exactly.
    pub fn check_amount(self) -> ResultSlip<Matched> {
        let difference = self.amount_difference();
        if difference.is_zero() && self.observation.qr_amount.is_some() {
            return Ok(self);
        }
        let rejection = Rejection::AmountMismatch {
            expected: self.state.0.order_amount,
            received: self.observation.qr_amount.unwrap_or_default(),
            difference,
        };
        Err(self.reject(rejection))
    }

    /// Performs a list of checks on the slip, stopping at the first failure
    pub async fn perform_checks(
        &self,
        ctx: &Context,
        checks: &[SlipCheck],
    ) -> Result<(), CheckError> {
        for check in checks {
            // return early on an error
            check.check(ctx, self).await?;
        }
        Ok(())
    }

    /// Completes all checks and transitions the slip to the next state
    ///
    /// Returns `Err` with the message of a retryable check failure,
    /// `Ok(Err)` with a [`SlipWithState<Rejected>`] when a check failed and
    /// `Ok(Ok)` with a [`SlipWithState<Checked>`] in case of success.
    pub async fn finalize_checks(
        self,
        ctx: &Context,
        checks: &[SlipCheck],
    ) -> Result<ResultSlip<Checked>, String> {
        match self.perform_checks(ctx, checks).await {
            Ok(()) => {
                let order = self.state.0.clone();
                Ok(Ok(self.perform_state_changes(Checked(order))))
            }
            Err(CheckError::Retryable(e)) => Err(e.to_string()),
            Err(CheckError::Failed(e)) => {
                let rejection = e
                    .downcast::<Rejection>()
                    .unwrap_or_else(|e| Rejection::CheckFailure {
                        reason: e.to_string(),
                    });
                Ok(Err(self.reject(rejection)))
            }
        }
    }
}

impl SlipWithState<Checked> {
    pub fn order(&self) -> &OrderMatch {
        &self.state.0
    }
}

impl SlipWithState<Rejected> {
    pub fn rejection(&self) -> &Rejection {
        &self.state.rejection
    }

    pub fn into_parts(self) -> (SlipObservation, Rejection) {
        (self.observation, self.state.rejection)
    }
}

impl<S> SlipWithState<S>
where
    S: SlipState,
{
    /// Moves the slip to the `Rejected` state
    pub fn reject(self, rejection: Rejection) -> SlipWithState<Rejected> {
        self.perform_state_changes(Rejected { rejection })
    }

    fn perform_state_changes<T>(self, new_state: T) -> SlipWithState<T>
    where
        T: SlipState,
    {
        SlipWithState {
            observation: self.observation,
            state: new_state,
        }
    }

    /// Returns the merged QR and OCR observation
    pub fn observation(&self) -> &SlipObservation {
        &self.observation
    }

    pub fn into_observation(self) -> SlipObservation {
        self.observation
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::{extraction::Reconciler, SlipScan};

    fn d(amount: &str) -> Decimal {
        amount.parse().unwrap()
    }

    fn scanned(qr_text: Option<&str>) -> SlipWithState<Scanned> {
        let scan = SlipScan::new(qr_text.map(str::to_owned), None);
        SlipWithState::new(Reconciler::default().reconcile(&scan))
    }

    #[fixture]
    fn payload() -> String {
        promptpay_qr::encode("ORD-1", Some(d("250.42"))).unwrap()
    }

    #[test]
    fn missing_qr_is_rejected_first() {
        assert_eq!(scanned(None).qr_amount(), Err(Rejection::QrNotFound));
    }

    #[test]
    fn qr_without_amount_is_rejected() {
        let payload = promptpay_qr::encode("ORD-1", None).unwrap();
        assert_eq!(
            scanned(Some(&payload)).qr_amount(),
            Err(Rejection::AmountExtractionFailed)
        );
    }

    #[rstest]
    fn exact_amount_passes(payload: String) {
        let slip = scanned(Some(&payload)).into_matched("ORD-1".to_owned(), d("250.420"));
        let slip = slip.check_amount().unwrap();
        assert_eq!(slip.amount_difference(), Decimal::ZERO);
    }

    #[rstest]
    #[case::one_satang_more("250.43", "0.01")]
    #[case::one_satang_less("250.41", "0.01")]
    #[case::undisambiguated("250", "0.42")]
    fn any_difference_is_rejected(
        payload: String,
        #[case] order_amount: &str,
        #[case] difference: &str,
    ) {
        let slip = scanned(Some(&payload)).into_matched("ORD-1".to_owned(), d(order_amount));
        let rejected = slip.check_amount().unwrap_err();
        assert_eq!(
            rejected.rejection(),
            &Rejection::AmountMismatch {
                expected: d(order_amount),
                received: d("250.42"),
                difference: d(difference),
            }
        );
    }
}
