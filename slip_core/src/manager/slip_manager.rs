// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use slip_receipt::{
    checks::CheckList, extraction::Reconciler, state::Rejected, Context, Rejection, SlipScan,
    SlipWithState,
};

use super::adapters::{
    AdminReview, CommitOutcome, OrderRead, OrderStore, PaymentCommit, ReviewOutcome,
    ReviewUpdate, SlipCommit, SlipReader, TransactionRead, TransactionStore, VerificationRead,
    VerificationStore,
};
use crate::{
    disambiguation::Disambiguator,
    model::{
        Inserted, Order, OrderStatus, Stored, Transaction, TransactionStatus, VerificationRecord,
        VerificationStatus, MAX_ORDER_ID_LENGTH,
    },
    webhook::{extract_notification_amount, notification_reference},
    AdminDecision, BankNotification, Error, ManagerConfig, NotificationOutcome, OrderTicket,
    RejectedSlip, ReviewedPayment, SlipUpload, SlipVerdict, VerifiedPayment,
};

pub struct Manager<E> {
    /// Context that implements adapters
    context: E,

    /// Checks that must pass for each slip matched to an order, after the
    /// strict amount and duplicate checks
    checks: CheckList,

    reconciler: Reconciler,

    /// Source of the cents added to new orders. Ownership stays with the
    /// manager so concurrent order creations share it.
    disambiguator: Disambiguator,

    config: ManagerConfig,
}

impl<E> Manager<E> {
    /// Creates new manager with provided `context`, any slip matched to an
    /// order by this manager will complete all `checks` before the payment is
    /// committed.
    pub fn new(context: E, checks: impl Into<CheckList>) -> Self {
        Self {
            context,
            checks: checks.into(),
            reconciler: Reconciler::default(),
            disambiguator: Disambiguator::default(),
            config: ManagerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_disambiguator(mut self, disambiguator: Disambiguator) -> Self {
        self.disambiguator = disambiguator;
        self
    }

    /// Replaces the OCR extraction patterns.
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn context(&self) -> &E {
        &self.context
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn encode_payload(&self, order_id: &str, amount: Decimal) -> Result<String, Error> {
        Ok(promptpay_qr::encode_with_profile(
            order_id,
            Some(amount),
            &self.config.merchant,
        )?)
    }
}

impl<E> Manager<E>
where
    E: OrderStore,
{
    /// Creates a pending order for `amount` plus a random number of satang,
    /// and the payment payload the customer must scan.
    ///
    /// Creating an order that already exists returns it with its stored
    /// amount; the amount is never disambiguated twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrderId`] for an empty or over-long id,
    /// [`Error::InvalidAmount`] for an amount that is not positive or too
    /// large to disambiguate,
    /// [`Error::CodecError`] when the id cannot be carried by a payload and
    /// [`Error::AdapterError`] if there are any errors while storing the order
    pub async fn create_order(
        &self,
        order_id: &str,
        amount: Decimal,
    ) -> Result<OrderTicket, Error> {
        let length = order_id.chars().count();
        if length == 0 || length > MAX_ORDER_ID_LENGTH {
            return Err(Error::InvalidOrderId {
                length,
                max: MAX_ORDER_ID_LENGTH,
            });
        }
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount { amount });
        }

        let final_amount = self
            .disambiguator
            .perturb(amount)
            .ok_or(Error::InvalidAmount { amount })?;
        // fails before storing when the id cannot be encoded
        let payload = self.encode_payload(order_id, final_amount)?;

        let inserted = self
            .context
            .insert_order(Order::new(order_id, final_amount, Utc::now()))
            .await
            .map_err(Error::adapter)?;

        let (order, payload, created) = match inserted {
            Inserted::Created(order) => {
                info!(
                    "Order created: order_id={}, amount={amount}, final_amount={}",
                    order.order_id, order.amount
                );
                (order, payload, true)
            }
            Inserted::Existing(order) => {
                debug!("Order {} already exists, returning it", order.order_id);
                let payload = self.encode_payload(&order.order_id, order.amount)?;
                (order, payload, false)
            }
        };

        Ok(OrderTicket {
            order_id: order.order_id,
            final_amount: order.amount,
            payload,
            created_at: order.created_at,
            created,
        })
    }
}

impl<E> Manager<E>
where
    E: OrderRead + TransactionRead + VerificationStore + SlipCommit,
{
    /// Verifies a slip already read into a [`SlipScan`].
    ///
    /// The slip goes through the following steps, the first failing one
    /// rejects it:
    /// 1. a QR payload must be present,
    /// 2. it must carry an amount,
    /// 3. the order is looked up by `order_id`, or else the most recent
    ///    pending order with exactly the QR amount is taken; when none is
    ///    found a rejected verification record is stored,
    /// 4. the order amount must equal the QR amount exactly,
    /// 5. the QR reference must not be held by a live transaction,
    /// 6. the user checks must pass,
    /// 7. the transaction, the verification record and the order completion
    ///    are committed together.
    ///
    /// The OCR amount never blocks a slip, a disagreement with the QR amount
    /// only lowers the recorded confidence.
    ///
    /// # Errors
    ///
    /// Rejections are returned as [`SlipVerdict::Rejected`]. Errors are:
    ///
    /// Returns [`Error::AdapterError`] if there are any errors while reading
    /// or committing; nothing is committed in that case
    ///
    /// Returns [`Error::RetryableCheck`] if a check could not complete
    pub async fn verify_slip(
        &self,
        ctx: &Context,
        scan: &SlipScan,
        order_id: Option<&str>,
    ) -> Result<SlipVerdict, Error> {
        self.verify_scan(ctx, scan, order_id, None).await
    }

    async fn verify_scan(
        &self,
        ctx: &Context,
        scan: &SlipScan,
        order_id: Option<&str>,
        slip_name: Option<&str>,
    ) -> Result<SlipVerdict, Error> {
        let observation = self.reconciler.reconcile(scan);
        debug!(
            "Slip read: qr_found={}, qr_amount={:?}, ocr_amount={:?}, confidence={}",
            observation.qr_found,
            observation.qr_amount,
            observation.ocr_amount,
            observation.confidence
        );
        let slip = SlipWithState::new(observation);

        let qr_amount = match slip.qr_amount() {
            Ok(amount) => amount,
            Err(rejection) => return Ok(rejected(slip.reject(rejection), None)),
        };

        let order = match order_id {
            Some(order_id) => self.context.order(order_id).await,
            None => self.context.latest_pending_order_with_amount(qr_amount).await,
        }
        .map_err(Error::adapter)?;

        let Some(order) = order else {
            let rejection = Rejection::NoMatchingOrder {
                qr_amount,
                order_id: order_id.map(str::to_owned),
            };
            let mut record = VerificationRecord::from_observation(slip.observation(), Utc::now());
            record.order_id = order_id.map(str::to_owned);
            record.status = VerificationStatus::Rejected;
            record.rejection_reason = Some(rejection.to_string());
            let verification_id = self
                .context
                .store_verification(record)
                .await
                .map_err(Error::adapter)?;
            return Ok(rejected(slip.reject(rejection), Some(verification_id)));
        };

        let slip = match slip
            .into_matched(order.order_id.clone(), order.amount)
            .check_amount()
        {
            Ok(slip) => slip,
            Err(mismatched) => return Ok(rejected(mismatched, None)),
        };

        let reference = match slip.observation().qr_reference.clone() {
            Some(reference) => {
                let in_use = self
                    .context
                    .is_reference_in_use(&reference)
                    .await
                    .map_err(Error::adapter)?;
                if in_use {
                    let rejection = Rejection::DuplicateTransaction { reference };
                    return Ok(rejected(slip.reject(rejection), None));
                }
                reference
            }
            // nothing to deduplicate on
            None => format!("{}_{qr_amount}", Utc::now().timestamp()),
        };

        if let Some(ocr_amount) = slip.observation().ocr_amount {
            if !slip.observation().amounts_match {
                warn!("OCR/QR amount mismatch: QR={qr_amount}, OCR={ocr_amount}");
            }
        }

        let slip = match slip
            .finalize_checks(ctx, &self.checks)
            .await
            .map_err(Error::RetryableCheck)?
        {
            Ok(slip) => slip,
            Err(failed) => return Ok(rejected(failed, None)),
        };

        let now = Utc::now();
        let mut transaction = Transaction::new(
            reference.clone(),
            qr_amount,
            TransactionStatus::Verified,
            now,
        );
        transaction.order_id = Some(order.order_id.clone());
        transaction.slip_name = slip_name.map(str::to_owned);

        let mut record = VerificationRecord::from_observation(slip.observation(), now);
        record.order_id = Some(order.order_id.clone());
        record.amounts_match = true;
        record.amount_difference = Some(Decimal::ZERO);
        record.order_amount = Some(order.amount);
        record.status = VerificationStatus::Verified;
        record.verified_at = Some(now);

        let outcome = self
            .context
            .commit_payment(PaymentCommit {
                order_id: order.order_id.clone(),
                transaction,
                verification: record,
                committed_at: now,
            })
            .await
            .map_err(Error::adapter)?;

        match outcome {
            CommitOutcome::Committed {
                order,
                transaction_id,
                verification_id,
            } => {
                let observation = slip.into_observation();
                info!(
                    "Payment verified: order_id={}, amount={}, reference={reference}, confidence={}, ocr_match={}",
                    order.order_id, order.amount, observation.confidence, observation.amounts_match
                );
                Ok(SlipVerdict::Verified(VerifiedPayment {
                    order,
                    transaction_id,
                    verification_id,
                    reference,
                    confidence: observation.confidence,
                    observation,
                }))
            }
            CommitOutcome::ReferenceTaken => {
                let rejection = Rejection::DuplicateTransaction { reference };
                Ok(rejected(slip.reject(rejection), None))
            }
            CommitOutcome::OrderNotPending => {
                let rejection = Rejection::NoMatchingOrder {
                    qr_amount,
                    order_id: Some(order.order_id),
                };
                Ok(rejected(slip.reject(rejection), None))
            }
        }
    }
}

impl<E> Manager<E>
where
    E: SlipReader + OrderRead + TransactionRead + VerificationStore + SlipCommit,
{
    /// Reads an uploaded slip image through the [`SlipReader`] and verifies
    /// it, see [`Manager::verify_slip`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySlipImage`] for an upload without bytes and
    /// [`Error::AdapterError`] if the image cannot be read at all
    pub async fn verify_slip_image(
        &self,
        ctx: &Context,
        upload: &SlipUpload,
    ) -> Result<SlipVerdict, Error> {
        if upload.image.is_empty() {
            return Err(Error::EmptySlipImage);
        }
        let scan = self
            .context
            .read_slip(&upload.image)
            .await
            .map_err(Error::adapter)?;
        self.verify_scan(
            ctx,
            &scan,
            upload.order_id.as_deref(),
            upload.file_name.as_deref(),
        )
        .await
    }
}

impl<E> Manager<E>
where
    E: TransactionStore,
{
    /// Records a bank notification as a `pending_slip` transaction.
    ///
    /// Recording the same notification twice returns the first transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AdapterError`] if there are any errors while storing
    /// the transaction
    pub async fn record_notification(
        &self,
        notification: &BankNotification,
    ) -> Result<NotificationOutcome, Error> {
        let Some(amount) = extract_notification_amount(&notification.text) else {
            warn!(
                "Could not extract amount from notification: {}",
                notification.text
            );
            return Ok(NotificationOutcome::AmountNotFound);
        };

        let reference = notification_reference(notification.timestamp, amount);
        let mut transaction = Transaction::new(
            reference,
            amount,
            TransactionStatus::PendingSlip,
            Utc::now(),
        );
        transaction.notification_text = Some(notification.text.clone());

        match self
            .context
            .insert_transaction(transaction)
            .await
            .map_err(Error::adapter)?
        {
            Inserted::Created(transaction) => {
                info!(
                    "Notification recorded: reference={}, amount={amount}",
                    transaction.reference
                );
                Ok(NotificationOutcome::Recorded(transaction))
            }
            Inserted::Existing(transaction) => {
                info!("Notification already recorded: {}", transaction.reference);
                Ok(NotificationOutcome::AlreadyRecorded(transaction))
            }
        }
    }
}

impl<E> Manager<E>
where
    E: AdminReview,
{
    /// Applies an admin decision to a verification record, its transaction
    /// and the order that transaction pays.
    ///
    /// Approving moves them to `approved_by_admin`, `verified` and
    /// `completed`; rejecting to `rejected`, `failed` and `failed`. A record
    /// can be decided once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VerificationNotFound`], [`Error::AlreadyReviewed`],
    /// [`Error::InvalidTransition`] when an entity cannot take its target
    /// status, [`Error::ReferenceInUse`] when approving would reinstate a
    /// transaction whose reference was taken since, and
    /// [`Error::AdapterError`] if there are any errors while writing
    pub async fn review_verification(
        &self,
        decision: AdminDecision,
    ) -> Result<ReviewedPayment, Error> {
        let AdminDecision {
            verification_id,
            approve,
            notes,
            admin,
        } = decision;

        let update = if approve {
            ReviewUpdate {
                verification_id,
                status: VerificationStatus::ApprovedByAdmin,
                transaction_status: TransactionStatus::Verified,
                order_status: OrderStatus::Completed,
                reviewed_by: admin.clone(),
                rejection_reason: None,
                admin_notes: notes,
                reviewed_at: Utc::now(),
            }
        } else {
            ReviewUpdate {
                verification_id,
                status: VerificationStatus::Rejected,
                transaction_status: TransactionStatus::Failed,
                order_status: OrderStatus::Failed,
                reviewed_by: admin.clone(),
                rejection_reason: Some(
                    notes
                        .clone()
                        .unwrap_or_else(|| "Rejected by admin".to_owned()),
                ),
                admin_notes: notes,
                reviewed_at: Utc::now(),
            }
        };

        match self
            .context
            .apply_review(update)
            .await
            .map_err(Error::adapter)?
        {
            ReviewOutcome::Applied {
                verification,
                transaction,
                order,
            } => {
                info!(
                    "Admin verification: verification_id={verification_id}, approved={approve}, admin={admin}"
                );
                Ok(ReviewedPayment {
                    verification,
                    transaction,
                    order,
                })
            }
            ReviewOutcome::NotFound => Err(Error::VerificationNotFound { verification_id }),
            ReviewOutcome::AlreadyReviewed { reviewed_by } => Err(Error::AlreadyReviewed {
                verification_id,
                reviewed_by,
            }),
            ReviewOutcome::ReferenceTaken { reference } => {
                Err(Error::ReferenceInUse { reference })
            }
            ReviewOutcome::InvalidTransition { entity, from, to } => {
                Err(Error::InvalidTransition { entity, from, to })
            }
        }
    }
}

impl<E> Manager<E>
where
    E: VerificationRead + VerificationStore,
{
    /// Moves a verification record to `manual_review`.
    ///
    /// This does not decide the record; an admin can still approve or
    /// reject it. Flagging a record already under review is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VerificationNotFound`], [`Error::AlreadyReviewed`]
    /// for a decided record and [`Error::InvalidTransition`] for a pending
    /// or approved one
    pub async fn flag_for_review(
        &self,
        verification_id: u64,
    ) -> Result<Stored<VerificationRecord>, Error> {
        let record = self
            .context
            .verification(verification_id)
            .await
            .map_err(Error::adapter)?
            .ok_or(Error::VerificationNotFound { verification_id })?;

        if let Some(reviewed_by) = &record.reviewed_by {
            return Err(Error::AlreadyReviewed {
                verification_id,
                reviewed_by: reviewed_by.clone(),
            });
        }
        if record.status == VerificationStatus::ManualReview {
            return Ok(record);
        }
        if !record
            .status
            .can_transition_to(VerificationStatus::ManualReview)
        {
            return Err(Error::InvalidTransition {
                entity: "verification",
                from: record.status.to_string(),
                to: VerificationStatus::ManualReview.to_string(),
            });
        }

        let record = self
            .context
            .update_verification_status(
                verification_id,
                VerificationStatus::ManualReview,
                Utc::now(),
            )
            .await
            .map_err(Error::adapter)?
            .ok_or(Error::VerificationNotFound { verification_id })?;
        info!("Verification {verification_id} flagged for manual review");
        Ok(record)
    }
}

impl<E> Manager<E>
where
    E: OrderRead,
{
    pub async fn order(&self, order_id: &str) -> Result<Option<Order>, Error> {
        self.context.order(order_id).await.map_err(Error::adapter)
    }
}

impl<E> Manager<E>
where
    E: TransactionRead,
{
    /// Returns the transaction holding `reference`, see
    /// [`TransactionRead::transaction_by_reference`].
    pub async fn transaction(&self, reference: &str) -> Result<Option<Stored<Transaction>>, Error> {
        self.context
            .transaction_by_reference(reference)
            .await
            .map_err(Error::adapter)
    }
}

impl<E> Manager<E>
where
    E: VerificationRead,
{
    /// Lists verification records, newest first.
    ///
    /// `limit` defaults to [`ManagerConfig::verification_list_limit`].
    pub async fn verifications(
        &self,
        status: Option<VerificationStatus>,
        limit: Option<usize>,
    ) -> Result<Vec<Stored<VerificationRecord>>, Error> {
        let limit = limit.unwrap_or(self.config.verification_list_limit);
        self.context
            .verifications(status, limit)
            .await
            .map_err(Error::adapter)
    }
}

fn rejected(slip: SlipWithState<Rejected>, verification: Option<u64>) -> SlipVerdict {
    let (observation, rejection) = slip.into_parts();
    warn!("Slip rejected ({}): {rejection}", rejection.kind());
    SlipVerdict::Rejected(RejectedSlip {
        rejection,
        observation,
        verification,
    })
}
