// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # PromptPay slip verification
//!
//! A merchant creates an order, the customer pays it by scanning a PromptPay
//! QR code in their banking app and uploads the transfer slip. This crate
//! decides whether the slip pays the order.
//!
//! Orders are created with a disambiguated amount (see [`disambiguation`]),
//! so a slip can be matched to its order by exact amount alone. Verification
//! is strict: the QR amount must equal the order amount to the satang, and a
//! transfer reference is consumed at most once.
//!
//! ## Getting started
//!
//! Take a look at the [`manager`] module to see how to drive the
//! verification and implement the needed adapters.
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> Result<(), slip_core::Error> {
//! use slip_core::{
//!     manager::{context::memory::InMemoryContext, Manager},
//!     SlipVerdict,
//! };
//! use slip_receipt::{checks::CheckList, Context, SlipScan};
//!
//! let manager = Manager::new(InMemoryContext::default(), CheckList::empty());
//! let ticket = manager.create_order("ORD-1001", "1500.50".parse().unwrap()).await?;
//!
//! let scan = SlipScan::new(Some(ticket.payload), None);
//! let verdict = manager.verify_slip(&Context::new(), &scan, None).await?;
//! assert!(matches!(verdict, SlipVerdict::Verified(_)));
//! # Ok(())
//! # }
//! ```

mod config;
pub mod disambiguation;
mod error;
pub mod manager;
pub mod model;
mod outcome;
pub mod webhook;

pub use config::{ManagerConfig, DEFAULT_VERIFICATION_LIST_LIMIT};
pub use error::{Error, Result};
pub use outcome::{
    AdminDecision, OrderTicket, RejectedSlip, ReviewedPayment, SlipUpload, SlipVerdict,
    VerifiedPayment,
};
pub use webhook::{BankNotification, NotificationOutcome};
