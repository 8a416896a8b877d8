//! Transactional persistence for the GreenChoice Ledger.
//!
//! The ledger keeps two durable tables, user accounts and orders, and
//! mutates them only through closure-scoped transactions. The streak engine
//! never sees a connection or a lock; it is handed a [`Transaction`] and the
//! store decides whether the closure's writes become visible.
//!
//! # Storage Backends
//!
//! All backends implement the [`LedgerStore`] trait:
//!
//! - [`InMemoryLedgerStore`] -- `HashMap`-based store for tests and embedding
//! - [`SqliteLedgerStore`] -- single-file SQLite database
//!
//! [`StoreBackend`] selects one of them at runtime.
//!
//! # Design Rules
//!
//! 1. A transaction commits only if its closure returns `Ok`.
//! 2. Errors and panics inside a transaction leave the store untouched.
//! 3. Accounts and orders are never deleted.
//! 4. All backend errors are propagated, never silently ignored.

pub mod backend;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use backend::StoreBackend;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;
pub use traits::{LedgerStore, Transaction};
