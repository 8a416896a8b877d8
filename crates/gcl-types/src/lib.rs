//! Foundation types for the GreenChoice Ledger (GCL).
//!
//! This crate provides the identifiers, records, and policy constants shared
//! by every other GCL crate.
//!
//! # Key Types
//!
//! - [`UserId`] / [`OrderId`] — Validated, trimmed string identifiers
//! - [`OrderStatus`] — Lifecycle status reported for an order
//! - [`UserAccount`] — Per-user streak and credit aggregate
//! - [`Order`] — Per-order ledger record with the award-applied flag
//! - [`RewardPolicy`] — Sustainability and carbon-reward thresholds

pub mod account;
pub mod error;
pub mod id;
pub mod order;
pub mod policy;
pub mod status;

pub use account::UserAccount;
pub use error::TypeError;
pub use id::{OrderId, UserId, MAX_ID_LEN};
pub use order::{Classification, Order};
pub use policy::{RewardPolicy, REWARD_THRESHOLD, SUSTAINABLE_THRESHOLD};
pub use status::OrderStatus;
