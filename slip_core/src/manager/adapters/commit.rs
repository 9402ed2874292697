// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{
    Order, OrderStatus, Stored, Transaction, TransactionStatus, VerificationRecord,
    VerificationStatus,
};

/// Everything written when a slip is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCommit {
    /// Order to move from pending to completed
    pub order_id: String,
    /// Verified transaction to insert
    pub transaction: Transaction,
    /// Verified record to insert, its `transaction_id` is filled by the store
    pub verification: VerificationRecord,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        /// The order after completion
        order: Order,
        transaction_id: u64,
        verification_id: u64,
    },
    /// A live transaction already holds the reference, nothing was written
    ReferenceTaken,
    /// The order is missing or no longer pending, nothing was written
    OrderNotPending,
}

/// Commits an accepted slip.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait SlipCommit {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Atomically inserts the transaction and the record and completes the
    /// order.
    ///
    /// The reference must be free and the order pending at the time of the
    /// write (check-then-insert and compare-and-swap). Otherwise nothing is
    /// written and the conflict is returned. An `AdapterError` must also
    /// leave no partial write behind.
    async fn commit_payment(
        &self,
        commit: PaymentCommit,
    ) -> Result<CommitOutcome, Self::AdapterError>;
}

/// An admin decision resolved into the target status of each entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewUpdate {
    pub verification_id: u64,
    pub status: VerificationStatus,
    /// Target of the linked transaction, if any
    pub transaction_status: TransactionStatus,
    /// Target of the order the linked transaction pays, if any
    pub order_status: OrderStatus,
    pub reviewed_by: String,
    pub admin_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Applied {
        verification: Stored<VerificationRecord>,
        transaction: Option<Stored<Transaction>>,
        order: Option<Order>,
    },
    NotFound,
    AlreadyReviewed {
        reviewed_by: String,
    },
    /// Reinstating the transaction would give its reference a second live holder
    ReferenceTaken {
        reference: String,
    },
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}

/// Applies admin decisions.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait AdminReview {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Atomically applies `update` to the record, its linked transaction and
    /// the order that transaction pays.
    ///
    /// A record that already carries `reviewed_by` is left untouched.
    /// Entities already in their target status are not modified.
    async fn apply_review(
        &self,
        update: ReviewUpdate,
    ) -> Result<ReviewOutcome, Self::AdapterError>;
}
