// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use promptpay_qr::MerchantProfile;
use serde::{Deserialize, Serialize};

/// Default number of records returned by [`crate::manager::Manager::verifications`].
pub const DEFAULT_VERIFICATION_LIST_LIMIT: usize = 100;

/// Settings of a [`crate::manager::Manager`].
///
/// Missing fields take their default value when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Merchant printed into generated payment payloads
    pub merchant: MerchantProfile,
    pub verification_list_limit: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            merchant: MerchantProfile::default(),
            verification_list_limit: DEFAULT_VERIFICATION_LIST_LIMIT,
        }
    }
}
