// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest order id accepted by [`crate::manager::Manager::create_order`].
pub const MAX_ORDER_ID_LENGTH: usize = 100;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
    Expired,
}

impl OrderStatus {
    /// Returns whether an order may move from `self` to `next`.
    ///
    /// `Completed -> Failed` and `Failed -> Completed` are admin decisions.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Completed | Failed | Expired) | (Completed, Failed) | (Failed, Completed)
        )
    }
}

/// An order awaiting (or having received) a PromptPay transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    /// Disambiguated amount, the one printed into the payment QR
    pub amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order.
    pub fn new(order_id: impl Into<String>, amount: Decimal, created_at: DateTime<Utc>) -> Self {
        Self {
            order_id: order_id.into(),
            amount,
            status: OrderStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::*;

    use super::OrderStatus::{self, *};

    #[rstest]
    #[case::paid(Pending, Completed, true)]
    #[case::admin_failed(Pending, Failed, true)]
    #[case::expired(Pending, Expired, true)]
    #[case::reversal(Completed, Failed, true)]
    #[case::admin_approval(Failed, Completed, true)]
    #[case::reopen(Completed, Pending, false)]
    #[case::expired_is_final(Expired, Completed, false)]
    #[case::no_self_loop(Pending, Pending, false)]
    fn order_transitions(#[case] from: OrderStatus, #[case] to: OrderStatus, #[case] legal: bool) {
        assert_eq!(from.can_transition_to(to), legal);
    }

    #[test]
    fn status_names_are_snake_case() {
        assert_eq!(Completed.to_string(), "completed");
        assert_eq!(OrderStatus::from_str("expired").unwrap(), Expired);
        assert_eq!(serde_json::to_string(&Pending).unwrap(), "\"pending\"");
    }
}
