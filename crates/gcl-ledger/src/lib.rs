//! Streak and carbon-reward ledger for the GreenChoice Ledger (GCL).
//!
//! This crate turns order status reports into account changes. It provides:
//! - The pure transition function ([`engine::transition`]) and its rules
//! - [`StreakLedger`], which upserts orders and runs the engine inside one
//!   store transaction per call, serialized per user
//! - Re-classification of existing orders
//! - Account/order lookups and a consistency [`audit`](audit::audit_account)

pub mod audit;
pub mod clock;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod request;

pub use audit::{audit_account, AuditReport, Violation, ViolationKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::Transition;
pub use error::{LedgerError, LedgerResult};
pub use ledger::StreakLedger;
pub use locks::UserLocks;
pub use request::{ReclassifyRequest, ReportOutcome, StatusReport};
