use std::path::Path;

use gcl_types::{Order, OrderId, UserAccount, UserId};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryLedgerStore;
use crate::sqlite::SqliteLedgerStore;
use crate::traits::{LedgerStore, Transaction};

/// A store chosen at runtime from configuration.
///
/// [`LedgerStore`] is generic over its transaction closure and so cannot be
/// used as a trait object; binaries pick a backend through this enum instead.
pub enum StoreBackend {
    Memory(InMemoryLedgerStore),
    Sqlite(SqliteLedgerStore),
}

impl StoreBackend {
    /// Open a SQLite database at `path`, or an in-memory store for `None`.
    pub fn open(path: Option<&Path>) -> StoreResult<Self> {
        match path {
            Some(path) => Ok(Self::Sqlite(SqliteLedgerStore::open(path)?)),
            None => Ok(Self::Memory(InMemoryLedgerStore::new())),
        }
    }

    /// Short backend name for logs and status endpoints.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Sqlite(_) => "sqlite",
        }
    }
}

impl LedgerStore for StoreBackend {
    fn user(&self, id: &UserId) -> StoreResult<Option<UserAccount>> {
        match self {
            Self::Memory(store) => store.user(id),
            Self::Sqlite(store) => store.user(id),
        }
    }

    fn order(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        match self {
            Self::Memory(store) => store.order(id),
            Self::Sqlite(store) => store.order(id),
        }
    }

    fn orders_for_user(&self, id: &UserId) -> StoreResult<Vec<Order>> {
        match self {
            Self::Memory(store) => store.orders_for_user(id),
            Self::Sqlite(store) => store.orders_for_user(id),
        }
    }

    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self {
            Self::Memory(store) => store.transact(f),
            Self::Sqlite(store) => store.transact(f),
        }
    }
}
