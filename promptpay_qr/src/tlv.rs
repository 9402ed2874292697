// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Tag-Length-Value fields
//!
//! Every field of a payload is written as a 2 character tag, a 2 digit
//! decimal length and the value itself. Lengths count bytes, so values are
//! restricted to ASCII when encoding.

use crate::CodecError;

/// Largest value a 2 digit length can describe.
pub const MAX_VALUE_LENGTH: usize = 99;

const HEADER_LENGTH: usize = 4;

/// A single field borrowed from the scanned input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    /// Byte offset of the tag within the scanned input
    pub offset: usize,
    pub tag: &'a str,
    pub value: &'a str,
}

/// Best-effort left-to-right scanner over TLV fields.
///
/// The scanner never fails: a non-numeric length, a length overrunning the
/// input or a header cut short ends the iteration and records the offset
/// in [`Fields::stopped_at`].
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    input: &'a str,
    position: usize,
    reserve: usize,
    stopped_at: Option<usize>,
}

/// Scans every field of `input`.
pub fn fields(input: &str) -> Fields<'_> {
    Fields::with_reserve(input, 0)
}

impl<'a> Fields<'a> {
    /// Scans `input` while more than `reserve` bytes remain.
    pub fn with_reserve(input: &'a str, reserve: usize) -> Self {
        Self {
            input,
            position: 0,
            reserve,
            stopped_at: None,
        }
    }

    /// Offset at which a malformed field stopped the scan, if any.
    pub fn stopped_at(&self) -> Option<usize> {
        self.stopped_at
    }

    fn stop(&mut self) -> Option<Field<'a>> {
        self.stopped_at = Some(self.position);
        self.position = self.input.len();
        None
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.input.len().saturating_sub(self.position);
        if remaining <= self.reserve {
            return None;
        }
        if remaining < HEADER_LENGTH {
            return self.stop();
        }

        let offset = self.position;
        let (Some(tag), Some(length)) = (
            self.input.get(offset..offset + 2),
            self.input.get(offset + 2..offset + HEADER_LENGTH),
        ) else {
            return self.stop();
        };
        if !length.bytes().all(|b| b.is_ascii_digit()) {
            return self.stop();
        }
        let Ok(length) = length.parse::<usize>() else {
            return self.stop();
        };

        let start = offset + HEADER_LENGTH;
        let Some(value) = self.input.get(start..start + length) else {
            return self.stop();
        };

        self.position = start + length;
        Some(Field { offset, tag, value })
    }
}

/// Appends TLV fields to a payload under construction.
#[derive(Debug, Default, Clone)]
pub struct TlvWriter {
    buffer: String,
}

impl TlvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `tag` with a length derived from `value`.
    pub fn push(&mut self, tag: &'static str, value: &str) -> Result<&mut Self, CodecError> {
        if !value.is_ascii() {
            return Err(CodecError::InvalidCharacter { tag });
        }
        if value.len() > MAX_VALUE_LENGTH {
            return Err(CodecError::FieldTooLong {
                tag,
                length: value.len(),
            });
        }
        self.buffer.push_str(tag);
        self.buffer.push_str(&format!("{:02}", value.len()));
        self.buffer.push_str(value);
        Ok(self)
    }

    /// Appends raw, already encoded bytes.
    pub fn push_raw(&mut self, raw: &str) -> &mut Self {
        self.buffer.push_str(raw);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}
