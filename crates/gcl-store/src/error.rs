/// Errors from ledger store operations.
///
/// Every variant is fatal for the call that produced it: the surrounding
/// transaction has been rolled back and the caller must retry the whole
/// operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A write raced with another writer for the same key.
    #[error("write conflict on {entity} '{key}'")]
    Conflict { entity: &'static str, key: String },

    /// A persisted row could not be decoded into a ledger record.
    #[error("corrupt {entity} row '{key}': {reason}")]
    CorruptRow {
        entity: &'static str,
        key: String,
        reason: String,
    },

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// Error from the SQLite backend.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
