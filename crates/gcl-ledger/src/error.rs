use gcl_store::StoreError;
use gcl_types::{OrderId, TypeError, UserId};

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed input, rejected before any mutation.
    #[error("validation error: {0}")]
    Validation(#[from] TypeError),

    /// The report names a different owner than the one recorded for the order.
    #[error("order {order_id} belongs to {owner}, not {claimed}")]
    OwnerMismatch {
        order_id: OrderId,
        owner: UserId,
        claimed: UserId,
    },

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The transaction was rolled back; the whole call may be retried.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Only storage failures are worth retrying; everything else is
    /// deterministic for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns `true` for lookup misses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::OrderNotFound(_))
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
