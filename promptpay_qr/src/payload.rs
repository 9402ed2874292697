// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Building and reading PromptPay payment request payloads.

use std::str::FromStr;

use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    crc::checksum,
    tag,
    tlv::{self, Fields, TlvWriter},
    CodecError,
};

/// PromptPay application identifier carried in the merchant account block.
pub const PROMPTPAY_APP_ID: &str = "A000000677010112";
/// Prefix every EMVCo payload starts with (format indicator `01`).
pub const FORMAT_INDICATOR: &str = "000201";
/// Dynamic (single use) point of initiation.
pub const DYNAMIC_INITIATION: &str = "12";
pub const MERCHANT_CATEGORY: &str = "4111";
/// ISO 4217 numeric code of the Thai Baht.
pub const CURRENCY_THB: &str = "764";
pub const COUNTRY_TH: &str = "TH";

/// Bytes at the end of a payload left to the checksum field when scanning.
const CHECKSUM_RESERVE: usize = 4;

/// Merchant name and city printed into every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub name: String,
    pub city: String,
}

impl Default for MerchantProfile {
    fn default() -> Self {
        Self {
            name: "MERCHANT".to_owned(),
            city: "BANGKOK".to_owned(),
        }
    }
}

/// A dynamic payment request addressed to a PromptPay account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub account_id: String,
    pub amount: Option<Decimal>,
    pub merchant: MerchantProfile,
}

impl PaymentRequest {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            amount: None,
            merchant: MerchantProfile::default(),
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_merchant(mut self, merchant: MerchantProfile) -> Self {
        self.merchant = merchant;
        self
    }

    /// Encodes the request into its wire payload, checksum included.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyAccountId`] for an empty account id,
    /// [`CodecError::NegativeAmount`] for an amount below zero and
    /// [`CodecError::FieldTooLong`] when any value (the nested merchant
    /// account block included) exceeds 99 bytes.
    pub fn encode(&self) -> Result<String, CodecError> {
        if self.account_id.is_empty() {
            return Err(CodecError::EmptyAccountId);
        }

        let mut merchant_account = TlvWriter::new();
        merchant_account
            .push(tag::APPLICATION_ID, PROMPTPAY_APP_ID)?
            .push(tag::ACCOUNT_ID, &self.account_id)?;

        let mut payload = TlvWriter::new();
        payload
            .push_raw(FORMAT_INDICATOR)
            .push(tag::INITIATION_METHOD, DYNAMIC_INITIATION)?
            .push(tag::MERCHANT_ACCOUNT, merchant_account.as_str())?
            .push(tag::MERCHANT_CATEGORY, MERCHANT_CATEGORY)?
            .push(tag::CURRENCY, CURRENCY_THB)?;
        if let Some(amount) = self.amount {
            payload.push(tag::AMOUNT, &format_amount(amount)?)?;
        }
        payload
            .push(tag::COUNTRY, COUNTRY_TH)?
            .push(tag::MERCHANT_NAME, &self.merchant.name)?
            .push(tag::CITY, &self.merchant.city)?
            .push_raw(tag::CHECKSUM)
            .push_raw("04");

        let crc = checksum(payload.as_str());
        Ok(payload.push_raw(&crc).as_str().to_owned())
    }
}

/// Encodes a payment request for `account_id` with the default merchant.
pub fn encode(account_id: &str, amount: Option<Decimal>) -> Result<String, CodecError> {
    let request = PaymentRequest::new(account_id);
    match amount {
        Some(amount) => request.with_amount(amount).encode(),
        None => request.encode(),
    }
}

/// Encodes a payment request for `account_id` printed with `merchant`.
pub fn encode_with_profile(
    account_id: &str,
    amount: Option<Decimal>,
    merchant: &MerchantProfile,
) -> Result<String, CodecError> {
    PaymentRequest {
        account_id: account_id.to_owned(),
        amount,
        merchant: merchant.clone(),
    }
    .encode()
}

/// Formats `amount` with exactly two decimal digits.
pub fn format_amount(amount: Decimal) -> Result<String, CodecError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CodecError::NegativeAmount {
            amount: amount.to_string(),
        });
    }
    let mut rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    Ok(rounded.to_string())
}

/// Outcome of comparing the embedded checksum to the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ChecksumStatus {
    Valid,
    Mismatch { expected: String, found: String },
    Missing,
}

impl ChecksumStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChecksumStatus::Valid)
    }
}

/// Fields recovered from a payload by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPayload {
    pub account_id: Option<String>,
    pub application_id: Option<String>,
    /// Raw merchant account block (tag `29`)
    pub merchant_account: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub merchant_name: Option<String>,
    pub city: Option<String>,
    pub checksum: ChecksumStatus,
    /// Offset where a malformed field ended the scan
    pub truncated_at: Option<usize>,
    pub raw: String,
}

impl DecodedPayload {
    fn empty(raw: &str) -> Self {
        Self {
            account_id: None,
            application_id: None,
            merchant_account: None,
            amount: None,
            currency: None,
            country: None,
            merchant_name: None,
            city: None,
            checksum: ChecksumStatus::Missing,
            truncated_at: None,
            raw: raw.to_owned(),
        }
    }
}

/// Decodes any payload string, best effort.
///
/// Fields are scanned left to right until only the checksum bytes remain;
/// unknown tags are skipped. Malformed input ends the scan and whatever was
/// parsed before it is returned. The checksum is reported in
/// [`DecodedPayload::checksum`] and never rejects the payload.
pub fn decode(payload: &str) -> DecodedPayload {
    let mut decoded = DecodedPayload::empty(payload);
    let mut scan = Fields::with_reserve(payload, CHECKSUM_RESERVE);

    for field in scan.by_ref() {
        match field.tag {
            tag::MERCHANT_ACCOUNT => {
                for nested in tlv::fields(field.value) {
                    match nested.tag {
                        tag::APPLICATION_ID => {
                            decoded.application_id = Some(nested.value.to_owned())
                        }
                        tag::ACCOUNT_ID => decoded.account_id = Some(nested.value.to_owned()),
                        _ => {}
                    }
                }
                decoded.merchant_account = Some(field.value.to_owned());
            }
            tag::AMOUNT => match Decimal::from_str(field.value) {
                Ok(amount) => decoded.amount = Some(amount),
                Err(err) => debug!("Ignoring unparsable amount {:?}: {err}", field.value),
            },
            tag::CURRENCY => decoded.currency = Some(field.value.to_owned()),
            tag::COUNTRY => decoded.country = Some(field.value.to_owned()),
            tag::MERCHANT_NAME => decoded.merchant_name = Some(field.value.to_owned()),
            tag::CITY => decoded.city = Some(field.value.to_owned()),
            tag::CHECKSUM => {
                // covers everything up to and including the checksum header
                let covered = &payload[..field.offset + 4];
                let expected = checksum(covered);
                decoded.checksum = if field.value.eq_ignore_ascii_case(&expected) {
                    ChecksumStatus::Valid
                } else {
                    ChecksumStatus::Mismatch {
                        expected,
                        found: field.value.to_owned(),
                    }
                };
            }
            _ => {}
        }
    }

    decoded.truncated_at = scan.stopped_at();
    if let Some(offset) = decoded.truncated_at {
        debug!("Payload scan stopped at offset {offset}");
    }
    decoded
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    fn d(amount: &str) -> Decimal {
        amount.parse().unwrap()
    }

    const ORDER_PAYLOAD: &str = "00020101021229320016A0000006770101120108ORD-100158044111530376454071500.375A02TH5908MERCHANT6007BANGKOK630485E4";

    #[test]
    fn encodes_wire_payload() {
        let payload = encode("ORD-1001", Some(d("1500.37"))).unwrap();
        insta::assert_snapshot!(payload, @"00020101021229320016A0000006770101120108ORD-100158044111530376454071500.375A02TH5908MERCHANT6007BANGKOK630485E4");
    }

    #[test]
    fn static_payload_has_no_amount_field() {
        let payload = encode("0812345678", None).unwrap();
        assert_eq!(
            payload,
            "00020101021229340016A000000677010112011008123456785804411153037645A02TH5908MERCHANT6007BANGKOK6304CC26"
        );
        assert!(decode(&payload).amount.is_none());
    }

    #[rstest]
    #[case::whole_amount(d("100"), "100.00")]
    #[case::one_decimal(d("99.5"), "99.50")]
    #[case::rounds_half_up(d("10.005"), "10.01")]
    #[case::zero(d("0"), "0.00")]
    fn amounts_have_two_decimals(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(format_amount(amount).unwrap(), expected);
    }

    #[rstest]
    #[case::empty_account("", Some(d("1")), CodecError::EmptyAccountId)]
    #[case::negative_amount("ORD-1", Some(d("-0.01")), CodecError::NegativeAmount { amount: "-0.01".to_owned() })]
    #[case::account_overflows_merchant_block(
        &"9".repeat(76),
        None,
        CodecError::FieldTooLong { tag: tag::MERCHANT_ACCOUNT, length: 100 }
    )]
    #[case::account_over_99(&"9".repeat(100), None, CodecError::FieldTooLong { tag: tag::ACCOUNT_ID, length: 100 })]
    fn rejects_invalid_requests(
        #[case] account_id: &str,
        #[case] amount: Option<Decimal>,
        #[case] expected: CodecError,
    ) {
        assert_eq!(encode(account_id, amount).unwrap_err(), expected);
    }

    #[rstest]
    #[case::order_id("ORD-1001", d("1500.37"))]
    #[case::phone_number("0812345678", d("0.01"))]
    #[case::longest_account(&"A".repeat(75), d("99999.99"))]
    fn decode_recovers_written_fields(#[case] account_id: &str, #[case] amount: Decimal) {
        let decoded = decode(&encode(account_id, Some(amount)).unwrap());
        assert_eq!(decoded.account_id.as_deref(), Some(account_id));
        assert_eq!(decoded.amount, Some(amount));
        assert_eq!(decoded.application_id.as_deref(), Some(PROMPTPAY_APP_ID));
        assert_eq!(decoded.currency.as_deref(), Some(CURRENCY_THB));
        assert_eq!(decoded.country.as_deref(), Some(COUNTRY_TH));
        assert_eq!(decoded.merchant_name.as_deref(), Some("MERCHANT"));
        assert_eq!(decoded.city.as_deref(), Some("BANGKOK"));
        assert_eq!(decoded.checksum, ChecksumStatus::Valid);
        assert_eq!(decoded.truncated_at, None);
    }

    #[test]
    fn custom_merchant_profile_is_encoded() {
        let payload = PaymentRequest::new("ORD-7")
            .with_amount(d("20"))
            .with_merchant(MerchantProfile {
                name: "SLIP SHOP".to_owned(),
                city: "CHIANG MAI".to_owned(),
            })
            .encode()
            .unwrap();
        let decoded = decode(&payload);
        assert_eq!(decoded.merchant_name.as_deref(), Some("SLIP SHOP"));
        assert_eq!(decoded.city.as_deref(), Some("CHIANG MAI"));
        assert!(decoded.checksum.is_valid());

        let merchant = MerchantProfile {
            name: "SLIP SHOP".to_owned(),
            city: "CHIANG MAI".to_owned(),
        };
        assert_eq!(
            encode_with_profile("ORD-7", Some(d("20")), &merchant).unwrap(),
            payload
        );
    }

    #[test]
    fn tampered_amount_is_flagged_but_still_decoded() {
        let tampered = ORDER_PAYLOAD.replace("1500.37", "1500.38");
        let decoded = decode(&tampered);
        assert_eq!(decoded.amount, Some(d("1500.38")));
        assert_eq!(
            decoded.checksum,
            ChecksumStatus::Mismatch {
                expected: "C0D0".to_owned(),
                found: "85E4".to_owned(),
            }
        );
    }

    #[test]
    fn lowercase_checksum_is_accepted() {
        let decoded = decode(&ORDER_PAYLOAD.replace("85E4", "85e4"));
        assert!(decoded.checksum.is_valid());
    }

    #[rstest]
    #[case::empty("")]
    #[case::garbage("hello world")]
    #[case::bad_length("000201010212290X")]
    #[case::overrun("00020101021229990016")]
    #[case::thai_text("เงินเข้า 100.50 บาท")]
    fn malformed_payloads_decode_partially(#[case] payload: &str) {
        let decoded = decode(payload);
        assert_eq!(decoded.raw, payload);
        assert!(decoded.amount.is_none());
        assert!(decoded.account_id.is_none());
    }

    #[test]
    fn scan_stops_before_broken_field_and_keeps_earlier_ones() {
        let broken = "00020101021229320016A0000006770101120108ORD-1001540X1500.375A02TH6304FFFF";
        let decoded = decode(broken);
        assert_eq!(decoded.account_id.as_deref(), Some("ORD-1001"));
        assert_eq!(decoded.amount, None);
        assert_eq!(decoded.checksum, ChecksumStatus::Missing);
        assert_eq!(decoded.truncated_at, Some(48));
    }
}
