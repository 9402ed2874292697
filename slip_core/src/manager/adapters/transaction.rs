// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::model::{Inserted, Stored, Transaction};

/// Retrieves transactions from storage.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait TransactionRead {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Retrieves the transaction holding `reference`.
    ///
    /// The live (non failed) transaction is preferred; otherwise the most
    /// recent failed one is returned.
    async fn transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Stored<Transaction>>, Self::AdapterError>;

    /// Returns whether a non failed transaction holds `reference`.
    async fn is_reference_in_use(&self, reference: &str) -> Result<bool, Self::AdapterError>;
}

/// Stores transactions.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait TransactionStore {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Stores `transaction` unless any transaction already carries its
    /// reference, in which case that one is returned untouched.
    ///
    /// The store assigns the id. The existence check and the insert must be
    /// atomic.
    async fn insert_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Inserted<Stored<Transaction>>, Self::AdapterError>;
}
