// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Slip extraction
//!
//! A slip is read twice by the image collaborator: once for its QR payload and
//! once through OCR. The [`Reconciler`] turns both raw outputs into a single
//! [`SlipObservation`] carrying an amount and a reference candidate from each
//! source, plus a [`Confidence`] label describing how well they agree.
//!
//! OCR extraction is driven by [`ExtractionPatterns`], an ordered list of
//! labelled regular expressions. The first pattern that matches wins, so more
//! specific phrasings must come first.

use std::{str::FromStr, sync::LazyLock};

use log::debug;
use promptpay_qr::{decode, DecodedPayload, FORMAT_INDICATOR};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::SlipScan;

/// Largest QR/OCR disagreement still considered a match (exclusive).
pub const OCR_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal amount, with optional thousands grouping or a decimal comma.
const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+[.,]\d{1,2})";

const AMOUNT_PATTERNS: &[(&str, &str)] = &[
    ("incoming_transfer", r"เงินเข้า\s*{amount}\s*บาท"),
    ("amount_label_thai", r"จำนวน(?:เงิน)?\s*:?\s*{amount}\s*บาท"),
    ("baht_suffix", r"{amount}\s*บาท"),
    ("balance_label_thai", r"ยอดเงิน\s*:?\s*{amount}"),
    ("amount_label", r"(?i)amount\s*:?\s*(?:THB|฿)?\s*{amount}"),
    ("thb_suffix", r"(?i){amount}\s*(?:THB|฿)"),
];

const REFERENCE_PATTERNS: &[(&str, &str)] = &[
    (
        "reference_label",
        r"\bRef(?:erence)?(?:\s*(?:No\.?|ID))?\s*:?\s*([A-Za-z0-9]+)",
    ),
    ("reference_label_thai", r"เลขอ้างอิง\s*:?\s*([A-Za-z0-9]+)"),
    (
        "transaction_id",
        r"(?i)\b(?:transaction|transfer)\s*(?:id|ref)\s*:?\s*([A-Za-z0-9]+)",
    ),
];

static DEFAULT_PATTERNS: LazyLock<ExtractionPatterns> = LazyLock::new(|| {
    let build = |table: &[(&str, &str)]| {
        table
            .iter()
            .map(|(label, pattern)| {
                LabeledPattern::new(*label, &pattern.replace("{amount}", AMOUNT))
                    .expect("invalid built-in extraction pattern")
            })
            .collect()
    };
    ExtractionPatterns {
        amount: build(AMOUNT_PATTERNS),
        reference: build(REFERENCE_PATTERNS),
    }
});

/// A regular expression whose first capture group holds the extracted value.
#[derive(Debug, Clone)]
pub struct LabeledPattern {
    pub label: String,
    regex: Regex,
}

impl LabeledPattern {
    pub fn new(label: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label: label.into(),
            regex: Regex::new(pattern)?,
        })
    }

    fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str())
    }
}

/// Ordered amount and reference patterns tried against OCR text.
#[derive(Debug, Clone)]
pub struct ExtractionPatterns {
    pub amount: Vec<LabeledPattern>,
    pub reference: Vec<LabeledPattern>,
}

impl Default for ExtractionPatterns {
    /// Thai and English phrasings found on Thai bank transfer slips.
    fn default() -> Self {
        DEFAULT_PATTERNS.clone()
    }
}

impl ExtractionPatterns {
    /// Appends an amount pattern, tried after the existing ones.
    pub fn with_amount_pattern(mut self, label: &str, pattern: &str) -> Result<Self, regex::Error> {
        self.amount.push(LabeledPattern::new(label, pattern)?);
        Ok(self)
    }

    /// Appends a reference pattern, tried after the existing ones.
    pub fn with_reference_pattern(
        mut self,
        label: &str,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        self.reference.push(LabeledPattern::new(label, pattern)?);
        Ok(self)
    }

    /// Returns the amount captured by the first matching pattern.
    pub fn find_amount(&self, text: &str) -> Option<Decimal> {
        self.amount.iter().find_map(|pattern| {
            let captured = pattern.capture(text)?;
            let amount = parse_amount(captured);
            if amount.is_some() {
                debug!("OCR amount {captured:?} matched by {}", pattern.label);
            }
            amount
        })
    }

    /// Returns the reference captured by the first matching pattern.
    pub fn find_reference(&self, text: &str) -> Option<String> {
        self.reference.iter().find_map(|pattern| {
            let captured = pattern.capture(text)?.trim();
            (!captured.is_empty()).then(|| captured.to_owned())
        })
    }
}

/// Parses an amount as printed on a slip.
///
/// A comma followed by exactly three digits is a thousands separator, any
/// other comma is a decimal comma.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let text = text.trim();
    let normalized = if text.contains('.') {
        text.replace(',', "")
    } else {
        match text.rsplit_once(',') {
            Some((_, fraction)) if fraction.len() == 3 => text.replace(',', ""),
            Some((whole, fraction)) => format!("{}.{fraction}", whole.replace(',', "")),
            None => text.to_owned(),
        }
    };
    Decimal::from_str(&normalized).ok()
}

/// Agreement between the QR and the OCR amounts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Confidence {
    /// Neither source produced an amount
    Low,
    /// Only one source produced an amount, or both disagree
    Medium,
    /// Both sources agree within [`OCR_TOLERANCE`]
    High,
}

impl Confidence {
    /// Returns whether both amounts agree, and the resulting confidence.
    pub fn from_amounts(qr_amount: Option<Decimal>, ocr_amount: Option<Decimal>) -> (bool, Self) {
        match (qr_amount, ocr_amount) {
            (Some(qr), Some(ocr)) if (qr - ocr).abs() < OCR_TOLERANCE => (true, Confidence::High),
            (Some(_), Some(_)) | (Some(_), None) | (None, Some(_)) => (false, Confidence::Medium),
            (None, None) => (false, Confidence::Low),
        }
    }
}

/// Merged result of reading a slip through QR and OCR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipObservation {
    pub qr_found: bool,
    pub qr_payload: Option<String>,
    /// Present when the QR payload is an EMVCo payload
    pub decoded: Option<DecodedPayload>,
    pub qr_amount: Option<Decimal>,
    pub qr_reference: Option<String>,
    pub qr_checksum_valid: Option<bool>,
    pub ocr_text: Option<String>,
    pub ocr_amount: Option<Decimal>,
    pub ocr_reference: Option<String>,
    /// QR and OCR amounts agree
    pub amounts_match: bool,
    pub confidence: Confidence,
}

/// Builds [`SlipObservation`]s from raw QR and OCR output.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    patterns: ExtractionPatterns,
}

impl Reconciler {
    pub fn new(patterns: ExtractionPatterns) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &ExtractionPatterns {
        &self.patterns
    }

    pub fn reconcile(&self, scan: &SlipScan) -> SlipObservation {
        let qr_payload = non_blank(scan.qr_text.as_deref());
        let ocr_text = non_blank(scan.ocr_text.as_deref());

        let decoded = qr_payload
            .filter(|payload| payload.starts_with(FORMAT_INDICATOR))
            .map(decode);
        let (qr_amount, qr_reference, qr_checksum_valid) = match (&decoded, qr_payload) {
            (Some(decoded), _) => (
                decoded.amount,
                decoded.account_id.clone(),
                Some(decoded.checksum.is_valid()),
            ),
            // not a payment payload, the whole text identifies the transfer
            (None, Some(raw)) => (None, Some(raw.to_owned()), None),
            (None, None) => (None, None, None),
        };

        let ocr_amount = ocr_text.and_then(|text| self.patterns.find_amount(text));
        let ocr_reference = ocr_text.and_then(|text| self.patterns.find_reference(text));

        let (amounts_match, confidence) = Confidence::from_amounts(qr_amount, ocr_amount);

        SlipObservation {
            qr_found: qr_payload.is_some(),
            qr_payload: qr_payload.map(str::to_owned),
            decoded,
            qr_amount,
            qr_reference,
            qr_checksum_valid,
            ocr_text: ocr_text.map(str::to_owned),
            ocr_amount,
            ocr_reference,
            amounts_match,
            confidence,
        }
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}
