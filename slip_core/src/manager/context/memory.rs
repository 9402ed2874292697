// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory context implementation for the slip manager.
//!
//! This module provides an in-memory implementation of every adapter. All
//! entities live in one [`Ledger`] behind a single lock, which makes the
//! multi-entity writes atomic. It is useful for testing and development
//! purposes.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use slip_receipt::SlipScan;
use thiserror::Error;

use crate::{
    manager::adapters::*,
    model::{
        Inserted, Order, OrderStatus, Stored, Transaction, VerificationRecord, VerificationStatus,
    },
};

/// Orders, transactions and verification records.
#[derive(Debug, Default)]
pub struct Ledger {
    pub orders: HashMap<String, Order>,
    pub transactions: BTreeMap<u64, Transaction>,
    pub verifications: BTreeMap<u64, VerificationRecord>,
}

impl Ledger {
    fn next_id<T>(records: &BTreeMap<u64, T>) -> u64 {
        records.keys().next_back().map_or(1, |id| id + 1)
    }

    /// Live transaction holding `reference`, other than `except`.
    fn live_holder(&self, reference: &str, except: Option<u64>) -> Option<(u64, &Transaction)> {
        self.transactions
            .iter()
            .rev()
            .find(|(id, tx)| {
                Some(**id) != except && tx.reference == reference && tx.status.holds_reference()
            })
            .map(|(id, tx)| (*id, tx))
    }
}

pub type LedgerStorage = Arc<RwLock<Ledger>>;
/// Scan results returned by [`SlipReader::read_slip`], keyed by image bytes.
pub type SlipScans = Arc<RwLock<HashMap<Vec<u8>, SlipScan>>>;

#[derive(Debug, Error)]
pub enum InMemoryError {
    #[error("something went wrong: {error}")]
    AdapterError { error: String },
}

#[derive(Clone, Default)]
pub struct InMemoryContext {
    /// local ledger with rwlocks to allow sharing with other components as needed
    ledger: LedgerStorage,
    scans: SlipScans,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryContext {
    pub fn new(ledger: LedgerStorage, scans: SlipScans) -> Self {
        InMemoryContext {
            ledger,
            scans,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn ledger(&self) -> LedgerStorage {
        self.ledger.clone()
    }

    /// Makes [`SlipReader::read_slip`] return `scan` for `image`.
    ///
    /// Unregistered images read as a slip with neither QR code nor text.
    pub fn register_slip(&self, image: impl Into<Vec<u8>>, scan: SlipScan) {
        self.scans.write().unwrap().insert(image.into(), scan);
    }

    /// Simulates a storage outage: every adapter call fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), InMemoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(InMemoryError::AdapterError {
                error: "storage unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRead for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn order(&self, order_id: &str) -> Result<Option<Order>, Self::AdapterError> {
        self.ensure_available()?;
        let ledger = self.ledger.read().unwrap();
        Ok(ledger.orders.get(order_id).cloned())
    }

    async fn latest_pending_order_with_amount(
        &self,
        amount: Decimal,
    ) -> Result<Option<Order>, Self::AdapterError> {
        self.ensure_available()?;
        let ledger = self.ledger.read().unwrap();
        Ok(ledger
            .orders
            .values()
            .filter(|order| order.is_pending() && order.amount == amount)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.order_id.cmp(&b.order_id))
            })
            .cloned())
    }
}

#[async_trait]
impl OrderStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn insert_order(&self, order: Order) -> Result<Inserted<Order>, Self::AdapterError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.write().unwrap();
        if let Some(existing) = ledger.orders.get(&order.order_id) {
            return Ok(Inserted::Existing(existing.clone()));
        }
        ledger.orders.insert(order.order_id.clone(), order.clone());
        Ok(Inserted::Created(order))
    }
}

#[async_trait]
impl TransactionRead for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Stored<Transaction>>, Self::AdapterError> {
        self.ensure_available()?;
        let ledger = self.ledger.read().unwrap();
        let found = ledger.live_holder(reference, None).or_else(|| {
            ledger
                .transactions
                .iter()
                .rev()
                .find(|(_, tx)| tx.reference == reference)
                .map(|(id, tx)| (*id, tx))
        });
        Ok(found.map(|(id, tx)| Stored::new(id, tx.clone())))
    }

    async fn is_reference_in_use(&self, reference: &str) -> Result<bool, Self::AdapterError> {
        self.ensure_available()?;
        let ledger = self.ledger.read().unwrap();
        Ok(ledger.live_holder(reference, None).is_some())
    }
}

#[async_trait]
impl TransactionStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn insert_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Inserted<Stored<Transaction>>, Self::AdapterError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.write().unwrap();
        if let Some((id, existing)) = ledger
            .transactions
            .iter()
            .rev()
            .find(|(_, tx)| tx.reference == transaction.reference)
        {
            return Ok(Inserted::Existing(Stored::new(*id, existing.clone())));
        }
        let id = Ledger::next_id(&ledger.transactions);
        ledger.transactions.insert(id, transaction.clone());
        Ok(Inserted::Created(Stored::new(id, transaction)))
    }
}

#[async_trait]
impl VerificationRead for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn verification(
        &self,
        verification_id: u64,
    ) -> Result<Option<Stored<VerificationRecord>>, Self::AdapterError> {
        self.ensure_available()?;
        let ledger = self.ledger.read().unwrap();
        Ok(ledger
            .verifications
            .get(&verification_id)
            .map(|record| Stored::new(verification_id, record.clone())))
    }

    async fn verifications(
        &self,
        status: Option<VerificationStatus>,
        limit: usize,
    ) -> Result<Vec<Stored<VerificationRecord>>, Self::AdapterError> {
        self.ensure_available()?;
        let ledger = self.ledger.read().unwrap();
        // ids grow with creation time
        Ok(ledger
            .verifications
            .iter()
            .rev()
            .filter(|(_, record)| status.is_none_or(|status| record.status == status))
            .take(limit)
            .map(|(id, record)| Stored::new(*id, record.clone()))
            .collect())
    }
}

#[async_trait]
impl VerificationStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn store_verification(
        &self,
        record: VerificationRecord,
    ) -> Result<u64, Self::AdapterError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.write().unwrap();
        let id = Ledger::next_id(&ledger.verifications);
        ledger.verifications.insert(id, record);
        Ok(id)
    }

    async fn update_verification_status(
        &self,
        verification_id: u64,
        status: VerificationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Stored<VerificationRecord>>, Self::AdapterError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.write().unwrap();
        let Some(record) = ledger.verifications.get_mut(&verification_id) else {
            return Ok(None);
        };
        if !record.status.can_transition_to(status) {
            return Err(InMemoryError::AdapterError {
                error: format!(
                    "verification {verification_id} cannot move from {} to {status}",
                    record.status
                ),
            });
        }
        record.status = status;
        record.updated_at = updated_at;
        Ok(Some(Stored::new(verification_id, record.clone())))
    }
}

#[async_trait]
impl SlipCommit for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn commit_payment(
        &self,
        commit: PaymentCommit,
    ) -> Result<CommitOutcome, Self::AdapterError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.write().unwrap();

        if ledger
            .live_holder(&commit.transaction.reference, None)
            .is_some()
        {
            return Ok(CommitOutcome::ReferenceTaken);
        }
        let order = match ledger.orders.get_mut(&commit.order_id) {
            Some(order) if order.is_pending() => {
                order.status = OrderStatus::Completed;
                order.updated_at = commit.committed_at;
                order.clone()
            }
            _ => return Ok(CommitOutcome::OrderNotPending),
        };

        let transaction_id = Ledger::next_id(&ledger.transactions);
        ledger.transactions.insert(transaction_id, commit.transaction);

        let verification_id = Ledger::next_id(&ledger.verifications);
        let mut verification = commit.verification;
        verification.transaction_id = Some(transaction_id);
        ledger.verifications.insert(verification_id, verification);

        Ok(CommitOutcome::Committed {
            order,
            transaction_id,
            verification_id,
        })
    }
}

#[async_trait]
impl AdminReview for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn apply_review(
        &self,
        update: ReviewUpdate,
    ) -> Result<ReviewOutcome, Self::AdapterError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.write().unwrap();

        let Some(record) = ledger.verifications.get(&update.verification_id) else {
            return Ok(ReviewOutcome::NotFound);
        };
        if let Some(reviewed_by) = &record.reviewed_by {
            return Ok(ReviewOutcome::AlreadyReviewed {
                reviewed_by: reviewed_by.clone(),
            });
        }
        if !record.status.can_transition_to(update.status) {
            return Ok(invalid_transition("verification", record.status, update.status));
        }

        // validate every linked entity before writing anything
        let transaction_id = record
            .transaction_id
            .filter(|id| ledger.transactions.contains_key(id));
        let mut order_id = None;
        if let Some(id) = transaction_id {
            let tx = &ledger.transactions[&id];
            if tx.status != update.transaction_status {
                if !tx.status.can_transition_to(update.transaction_status) {
                    return Ok(invalid_transition(
                        "transaction",
                        tx.status,
                        update.transaction_status,
                    ));
                }
                if update.transaction_status.holds_reference()
                    && ledger.live_holder(&tx.reference, Some(id)).is_some()
                {
                    return Ok(ReviewOutcome::ReferenceTaken {
                        reference: tx.reference.clone(),
                    });
                }
            }
            if let Some(order) = tx.order_id.as_ref().and_then(|id| ledger.orders.get(id)) {
                if order.status != update.order_status
                    && !order.status.can_transition_to(update.order_status)
                {
                    return Ok(invalid_transition("order", order.status, update.order_status));
                }
                order_id = Some(order.order_id.clone());
            }
        }

        let transaction = transaction_id.and_then(|id| {
            let tx = ledger.transactions.get_mut(&id)?;
            if tx.status != update.transaction_status {
                tx.status = update.transaction_status;
                tx.updated_at = update.reviewed_at;
            }
            Some(Stored::new(id, tx.clone()))
        });
        let order = order_id.and_then(|id| {
            let order = ledger.orders.get_mut(&id)?;
            if order.status != update.order_status {
                order.status = update.order_status;
                order.updated_at = update.reviewed_at;
            }
            Some(order.clone())
        });

        let Some(record) = ledger.verifications.get_mut(&update.verification_id) else {
            return Ok(ReviewOutcome::NotFound);
        };
        record.status = update.status;
        record.reviewed_by = Some(update.reviewed_by);
        record.admin_notes = update.admin_notes;
        if update.rejection_reason.is_some() {
            record.rejection_reason = update.rejection_reason;
        }
        record.updated_at = update.reviewed_at;

        Ok(ReviewOutcome::Applied {
            verification: Stored::new(update.verification_id, record.clone()),
            transaction,
            order,
        })
    }
}

fn invalid_transition(
    entity: &'static str,
    from: impl ToString,
    to: impl ToString,
) -> ReviewOutcome {
    ReviewOutcome::InvalidTransition {
        entity,
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[async_trait]
impl SlipReader for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn read_slip(&self, image: &[u8]) -> Result<SlipScan, Self::AdapterError> {
        self.ensure_available()?;
        let scans = self.scans.read().unwrap();
        Ok(scans.get(image).cloned().unwrap_or_default())
    }
}
