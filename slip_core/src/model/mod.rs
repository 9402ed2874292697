// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Persisted entities and their status lifecycles.
//!
//! Every status is a closed enum with a `can_transition_to` table. Stores
//! refuse any transition the table does not list.

mod order;
mod transaction;
mod verification;

pub use order::{Order, OrderStatus, MAX_ORDER_ID_LENGTH};
use serde::{Deserialize, Serialize};
pub use transaction::{Transaction, TransactionStatus};
pub use verification::{VerificationRecord, VerificationStatus};

/// A record together with the id its store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: u64,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: u64, record: T) -> Self {
        Self { id, record }
    }
}

impl<T> std::ops::Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

/// Result of an insert-if-absent operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted<T> {
    /// The record was stored
    Created(T),
    /// A record with the same key already existed and was left untouched
    Existing(T),
}

impl<T> Inserted<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Inserted::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Inserted::Created(record) | Inserted::Existing(record) => record,
        }
    }
}
