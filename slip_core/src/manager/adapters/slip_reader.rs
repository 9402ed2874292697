// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use slip_receipt::SlipScan;

/// Reads the QR code and the text printed on a slip image.
///
/// Implementations wrap a QR detector and an OCR engine. Either may find
/// nothing, which is reported through the `Option` fields of [`SlipScan`]
/// rather than as an error. Errors are reserved for images that cannot be
/// read at all.
#[async_trait]
pub trait SlipReader {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    async fn read_slip(&self, image: &[u8]) -> Result<SlipScan, Self::AdapterError>;
}
