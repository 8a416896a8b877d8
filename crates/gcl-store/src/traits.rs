use gcl_types::{Order, OrderId, UserAccount, UserId};

use crate::error::{StoreError, StoreResult};

/// Read/write view over the store, valid for the lifetime of one transaction.
///
/// Reads observe the transaction's own uncommitted writes.
pub trait Transaction {
    /// Read a user account. `Ok(None)` if the user has never been written.
    fn user(&mut self, id: &UserId) -> StoreResult<Option<UserAccount>>;

    /// Read an order. `Ok(None)` if the order does not exist.
    fn order(&mut self, id: &OrderId) -> StoreResult<Option<Order>>;

    /// Create or overwrite a user account.
    fn put_user(&mut self, account: &UserAccount) -> StoreResult<()>;

    /// Create an order. Fails with [`StoreError::Conflict`] if it already exists.
    fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

    /// Overwrite an existing order. Fails with [`StoreError::Conflict`] if it
    /// does not exist.
    fn update_order(&mut self, order: &Order) -> StoreResult<()>;
}

/// Durable home of user accounts and orders.
///
/// All implementations must satisfy these invariants:
/// - At most one account per `user_id` and one order per `order_id`.
/// - Nothing is ever deleted.
/// - [`LedgerStore::transact`] is all-or-nothing: writes made through the
///   [`Transaction`] become visible only if the closure returns `Ok` and the
///   commit succeeds. Any error or panic leaves the store untouched.
pub trait LedgerStore: Send + Sync {
    /// Read a committed user account.
    fn user(&self, id: &UserId) -> StoreResult<Option<UserAccount>>;

    /// Read a committed order.
    fn order(&self, id: &OrderId) -> StoreResult<Option<Order>>;

    /// All committed orders owned by a user, sorted by `order_id`.
    fn orders_for_user(&self, id: &UserId) -> StoreResult<Vec<Order>>;

    /// Run `f` inside a transaction, committing only if it returns `Ok`.
    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>;
}
