// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{Stored, VerificationRecord, VerificationStatus};

/// Retrieves verification records from storage.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait VerificationRead {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    async fn verification(
        &self,
        verification_id: u64,
    ) -> Result<Option<Stored<VerificationRecord>>, Self::AdapterError>;

    /// Retrieves at most `limit` records, newest first, optionally only
    /// those with the given status.
    async fn verifications(
        &self,
        status: Option<VerificationStatus>,
        limit: usize,
    ) -> Result<Vec<Stored<VerificationRecord>>, Self::AdapterError>;
}

/// Stores verification records.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait VerificationStore {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Stores a new record and returns the id assigned to it.
    async fn store_verification(
        &self,
        record: VerificationRecord,
    ) -> Result<u64, Self::AdapterError>;

    /// Moves a record to `status` if its current status allows it.
    ///
    /// Returns the updated record, or `None` when no record has this id.
    /// An illegal transition is reported as an `AdapterError`.
    async fn update_verification_status(
        &self,
        verification_id: u64,
        status: VerificationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Stored<VerificationRecord>>, Self::AdapterError>;
}
