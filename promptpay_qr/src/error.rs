// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

/// Errors returned while building a payment request payload
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("account id must not be empty")]
    EmptyAccountId,
    #[error("amount must not be negative: {amount}")]
    NegativeAmount { amount: String },
    #[error("value of tag {tag} is {length} bytes long (max 99)")]
    FieldTooLong { tag: &'static str, length: usize },
    #[error("value of tag {tag} contains non-ASCII characters")]
    InvalidCharacter { tag: &'static str },
}
