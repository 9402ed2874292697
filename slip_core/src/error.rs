// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error type and Result typedef
//!
//! Faults and contract violations only. Refused slips are not errors, they
//! come back as [`crate::SlipVerdict::Rejected`].

use promptpay_qr::CodecError;
use rust_decimal::Decimal;

/// Error type for the slip verification core
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error when an adapter (storage, slip reader) fails
    #[error("Error from adapter.\n Caused by: {source_error}")]
    AdapterError { source_error: anyhow::Error },

    #[error("Slip image is empty")]
    EmptySlipImage,

    #[error("Order amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Order id must be between 1 and {max} characters, got {length}")]
    InvalidOrderId { length: usize, max: usize },

    /// Error when the payment payload cannot be encoded
    #[error(transparent)]
    CodecError(#[from] CodecError),

    /// A check could not complete, the slip may be submitted again
    #[error("Failed to check the slip: {0}")]
    RetryableCheck(String),

    #[error("Verification {verification_id} not found")]
    VerificationNotFound { verification_id: u64 },

    #[error("Verification {verification_id} was already reviewed by {reviewed_by}")]
    AlreadyReviewed {
        verification_id: u64,
        reviewed_by: String,
    },

    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Error when reinstating a transaction whose reference another live
    /// transaction now holds
    #[error("Reference {reference} is held by another transaction")]
    ReferenceInUse { reference: String },
}

impl Error {
    pub(crate) fn adapter<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::AdapterError {
            source_error: anyhow::Error::new(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
