// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Bank notification pre-stage
//!
//! Banking apps push a notification for every incoming transfer, e.g.
//! `เงินเข้า 100.50 บาท เวลา 12:00`. Recording it ahead of the slip creates a
//! `pending_slip` transaction placeholder. This path never completes an order.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use slip_receipt::extraction::{parse_amount, ExtractionPatterns};

use crate::model::{Stored, Transaction};

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:,\d{3})*(?:[.,]\d+)?").expect("invalid built-in number pattern")
});

/// A push notification forwarded by the bank companion app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankNotification {
    /// e.g. `LINE`
    pub app: String,
    /// e.g. `LINE BK`
    pub title: String,
    pub text: String,
    /// Unix timestamp, in seconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Recorded(Stored<Transaction>),
    /// A transaction with the same reference was recorded earlier
    AlreadyRecorded(Stored<Transaction>),
    AmountNotFound,
}

/// Extracts the transferred amount from a notification text.
///
/// Labelled slip phrasings are tried first, then the first number in the
/// text. Times such as `12:00` follow the amount in bank notifications, so
/// the first number is preferred over the last.
pub fn extract_notification_amount(text: &str) -> Option<Decimal> {
    static PATTERNS: LazyLock<ExtractionPatterns> = LazyLock::new(ExtractionPatterns::default);

    PATTERNS.find_amount(text).or_else(|| {
        FIRST_NUMBER
            .find(text)
            .and_then(|number| parse_amount(number.as_str()))
    })
}

/// Reference of a notified transfer: `{timestamp}_{amount}` without the
/// decimal point. Trailing zeros are dropped, 300.00 gives `_300`.
pub fn notification_reference(timestamp: i64, amount: Decimal) -> String {
    format!("{timestamp}_{}", amount.normalize()).replace('.', "")
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    fn d(amount: &str) -> Decimal {
        amount.parse().unwrap()
    }

    #[rstest]
    #[case::line_bank("เงินเข้า 100.50 บาท เวลา 12:00", Some("100.50"))]
    #[case::grouped("โอนเงิน 1,250.00 บาท", Some("1250.00"))]
    #[case::english("Received THB 42.75 from SCB at 09:15", Some("42.75"))]
    #[case::integer_only("เงินเข้า 300 บาท", Some("300"))]
    #[case::decimal_comma("Eingang 15,5", Some("15.5"))]
    #[case::no_number("เงินเข้าแล้ว", None)]
    fn extracts_notification_amount(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_notification_amount(text), expected.map(d));
    }

    #[rstest]
    #[case::trailing_zero(d("100.50"), "1678888888_1005")]
    #[case::two_decimals(d("42.75"), "1678888888_4275")]
    #[case::whole(d("300"), "1678888888_300")]
    fn references_drop_the_decimal_point(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(notification_reference(1678888888, amount), expected);
    }
}
