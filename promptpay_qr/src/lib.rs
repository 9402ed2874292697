// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # PromptPay payment request codec
//!
//! This crate builds and reads the EMVCo Tag-Length-Value payloads rendered
//! into PromptPay QR codes. A payload is a sequence of `tag + length + value`
//! fields closed by a CRC-16/CCITT-FALSE checksum.
//!
//! # Example
//! ```rust
//! use promptpay_qr::{decode, encode, ChecksumStatus};
//! use rust_decimal::Decimal;
//!
//! let amount: Decimal = "1500.37".parse().unwrap();
//! let payload = encode("ORD-1001", Some(amount)).unwrap();
//! let decoded = decode(&payload);
//!
//! assert_eq!(decoded.amount, Some(amount));
//! assert_eq!(decoded.account_id.as_deref(), Some("ORD-1001"));
//! assert_eq!(decoded.checksum, ChecksumStatus::Valid);
//! ```
//!

mod crc;
mod error;
mod payload;
pub mod tlv;

pub use crc::{checksum, crc16, CRC_INITIAL, CRC_POLYNOMIAL};
pub use error::CodecError;
pub use payload::{
    decode, encode, encode_with_profile, format_amount, ChecksumStatus, DecodedPayload,
    MerchantProfile, PaymentRequest, COUNTRY_TH, CURRENCY_THB, DYNAMIC_INITIATION,
    FORMAT_INDICATOR, MERCHANT_CATEGORY, PROMPTPAY_APP_ID,
};

/// Field tags used by PromptPay payloads.
pub mod tag {
    pub const INITIATION_METHOD: &str = "01";
    pub const MERCHANT_ACCOUNT: &str = "29";
    pub const CURRENCY: &str = "53";
    pub const AMOUNT: &str = "54";
    pub const MERCHANT_CATEGORY: &str = "58";
    pub const COUNTRY: &str = "5A";
    pub const MERCHANT_NAME: &str = "59";
    pub const CITY: &str = "60";
    pub const CHECKSUM: &str = "63";

    /// Application identifier, nested in [`MERCHANT_ACCOUNT`]
    pub const APPLICATION_ID: &str = "00";
    /// Account identifier, nested in [`MERCHANT_ACCOUNT`]
    pub const ACCOUNT_ID: &str = "01";
}
