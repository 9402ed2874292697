// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::model::{Inserted, Order};

/// Retrieves orders from storage.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait OrderRead {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Retrieves the order with the given id, whatever its status.
    async fn order(&self, order_id: &str) -> Result<Option<Order>, Self::AdapterError>;

    /// Retrieves the most recently created pending order whose amount
    /// equals `amount` exactly.
    async fn latest_pending_order_with_amount(
        &self,
        amount: Decimal,
    ) -> Result<Option<Order>, Self::AdapterError>;
}

/// Stores orders.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait OrderStore {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Stores `order` unless an order with the same id exists, in which case
    /// the stored order is returned untouched.
    ///
    /// The existence check and the insert must be atomic.
    async fn insert_order(&self, order: Order) -> Result<Inserted<Order>, Self::AdapterError>;
}
