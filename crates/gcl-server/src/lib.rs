//! HTTP adapter for the GreenChoice Ledger.
//!
//! Exposes order status reports, re-classification, account and order
//! lookups, and product classification as a small JSON API for the browser
//! extension. Ledger calls run on the blocking pool; errors become
//! `{"error": ...}` bodies with a status code per error kind.

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{GclConfig, ServerConfig, StoreConfig};
pub use error::{ErrorBody, ServerError, ServerResult};
pub use handler::{AppState, Ledger};
pub use server::GclServer;
