use std::collections::HashMap;
use std::sync::RwLock;

use gcl_types::{Order, OrderId, UserAccount, UserId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{LedgerStore, Transaction};

/// In-memory, HashMap-based ledger store.
///
/// Intended for tests and embedding. Transactions stage their writes locally
/// and apply them under a single write lock at commit, so concurrent readers
/// never observe a half-applied transition.
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserAccount>,
    orders: HashMap<OrderId, Order>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Number of user accounts stored.
    pub fn user_count(&self) -> usize {
        self.tables.read().map(|t| t.users.len()).unwrap_or(0)
    }

    /// Number of orders stored.
    pub fn order_count(&self) -> usize {
        self.tables.read().map(|t| t.orders.len()).unwrap_or(0)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn user(&self, id: &UserId) -> StoreResult<Option<UserAccount>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.users.get(id).cloned())
    }

    fn order(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.orders.get(id).cloned())
    }

    fn orders_for_user(&self, id: &UserId) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| &order.user_id == id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        Ok(orders)
    }

    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut staged = StagedTransaction {
            tables: &self.tables,
            users: HashMap::new(),
            inserted: HashMap::new(),
            updated: HashMap::new(),
        };
        let out = f(&mut staged)?;
        staged.commit()?;
        Ok(out)
    }
}

/// Buffered writes for one in-memory transaction. Dropping it without
/// calling `commit` discards everything.
struct StagedTransaction<'a> {
    tables: &'a RwLock<Tables>,
    users: HashMap<UserId, UserAccount>,
    inserted: HashMap<OrderId, Order>,
    updated: HashMap<OrderId, Order>,
}

impl StagedTransaction<'_> {
    fn committed_order_exists(&self, id: &OrderId) -> StoreResult<bool> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.orders.contains_key(id))
    }

    fn commit(self) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;

        // Validate everything before touching the tables.
        for id in self.inserted.keys() {
            if tables.orders.contains_key(id) {
                return Err(StoreError::Conflict {
                    entity: "order",
                    key: id.to_string(),
                });
            }
        }
        for id in self.updated.keys() {
            if !tables.orders.contains_key(id) {
                return Err(StoreError::Conflict {
                    entity: "order",
                    key: id.to_string(),
                });
            }
        }

        let writes = self.users.len() + self.inserted.len() + self.updated.len();
        tables.users.extend(self.users);
        tables.orders.extend(self.inserted);
        tables.orders.extend(self.updated);
        debug!(writes, "in-memory transaction committed");
        Ok(())
    }
}

impl Transaction for StagedTransaction<'_> {
    fn user(&mut self, id: &UserId) -> StoreResult<Option<UserAccount>> {
        if let Some(account) = self.users.get(id) {
            return Ok(Some(account.clone()));
        }
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.users.get(id).cloned())
    }

    fn order(&mut self, id: &OrderId) -> StoreResult<Option<Order>> {
        if let Some(order) = self.updated.get(id).or_else(|| self.inserted.get(id)) {
            return Ok(Some(order.clone()));
        }
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.orders.get(id).cloned())
    }

    fn put_user(&mut self, account: &UserAccount) -> StoreResult<()> {
        self.users.insert(account.user_id.clone(), account.clone());
        Ok(())
    }

    fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        if self.inserted.contains_key(&order.order_id)
            || self.committed_order_exists(&order.order_id)?
        {
            return Err(StoreError::Conflict {
                entity: "order",
                key: order.order_id.to_string(),
            });
        }
        self.inserted.insert(order.order_id.clone(), order.clone());
        Ok(())
    }

    fn update_order(&mut self, order: &Order) -> StoreResult<()> {
        if let Some(pending) = self.inserted.get_mut(&order.order_id) {
            *pending = order.clone();
            return Ok(());
        }
        if !self.updated.contains_key(&order.order_id)
            && !self.committed_order_exists(&order.order_id)?
        {
            return Err(StoreError::Conflict {
                entity: "order",
                key: order.order_id.to_string(),
            });
        }
        self.updated.insert(order.order_id.clone(), order.clone());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedgerStore")
            .field("user_count", &self.user_count())
            .field("order_count", &self.order_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gcl_types::{Classification, OrderStatus, RewardPolicy};

    fn user_id(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn make_order(id: &str, owner: &str) -> Order {
        Order::new(
            OrderId::new(id).unwrap(),
            user_id(owner),
            OrderStatus::Placed,
            Classification::default(),
            &RewardPolicy::default(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
    }

    fn write_order(store: &InMemoryLedgerStore, order: &Order) {
        store
            .transact(|tx| {
                tx.put_user(&UserAccount::new(order.user_id.clone()))?;
                tx.insert_order(order)
            })
            .unwrap();
    }

    // -----------------------------------------------------------------------
    // Commit / rollback
    // -----------------------------------------------------------------------

    #[test]
    fn committed_writes_are_visible() {
        let store = InMemoryLedgerStore::new();
        let order = make_order("o1", "u1");
        write_order(&store, &order);

        assert_eq!(store.order(&order.order_id).unwrap(), Some(order));
        assert!(store.user(&user_id("u1")).unwrap().is_some());
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.order_count(), 1);
    }

    #[test]
    fn error_in_closure_rolls_back() {
        let store = InMemoryLedgerStore::new();
        let result: Result<(), StoreError> = store.transact(|tx| {
            tx.put_user(&UserAccount::new(user_id("u1")))?;
            tx.insert_order(&make_order("o1", "u1"))?;
            Err(StoreError::Backend("boom".into()))
        });

        assert!(result.is_err());
        assert!(store.user(&user_id("u1")).unwrap().is_none());
        assert_eq!(store.order_count(), 0);
    }

    #[test]
    fn uncommitted_writes_are_invisible_to_other_readers() {
        let store = InMemoryLedgerStore::new();
        store
            .transact(|tx| {
                tx.put_user(&UserAccount::new(user_id("u1")))?;
                assert!(store.user(&user_id("u1"))?.is_none());
                Ok::<_, StoreError>(())
            })
            .unwrap();
        assert!(store.user(&user_id("u1")).unwrap().is_some());
    }

    #[test]
    fn transaction_reads_its_own_writes() {
        let store = InMemoryLedgerStore::new();
        store
            .transact(|tx| {
                let order = make_order("o1", "u1");
                tx.insert_order(&order)?;
                let mut read = tx.order(&order.order_id)?.expect("staged order");
                read.lifecycle_status = OrderStatus::Delivered;
                tx.update_order(&read)?;
                let reread = tx.order(&order.order_id)?.expect("staged order");
                assert_eq!(reread.lifecycle_status, OrderStatus::Delivered);
                tx.put_user(&UserAccount::new(user_id("u1")))
            })
            .unwrap();
        let stored = store.order(&OrderId::new("o1").unwrap()).unwrap().unwrap();
        assert_eq!(stored.lifecycle_status, OrderStatus::Delivered);
    }

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------

    #[test]
    fn insert_of_existing_order_conflicts() {
        let store = InMemoryLedgerStore::new();
        write_order(&store, &make_order("o1", "u1"));

        let err = store
            .transact(|tx| tx.insert_order(&make_order("o1", "u2")))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { entity: "order", .. }));
    }

    #[test]
    fn update_of_missing_order_conflicts() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .transact(|tx| tx.update_order(&make_order("ghost", "u1")))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn racing_insert_fails_at_commit() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .transact(|tx| {
                tx.insert_order(&make_order("o1", "u1"))?;
                // Another writer commits the same order first.
                write_order(&store, &make_order("o1", "u2"));
                Ok::<_, StoreError>(())
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        let winner = store.order(&OrderId::new("o1").unwrap()).unwrap().unwrap();
        assert_eq!(winner.user_id, user_id("u2"));
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[test]
    fn orders_for_user_is_filtered_and_sorted() {
        let store = InMemoryLedgerStore::new();
        write_order(&store, &make_order("o3", "u1"));
        write_order(&store, &make_order("o1", "u1"));
        write_order(&store, &make_order("o2", "u2"));

        let ids: Vec<String> = store
            .orders_for_user(&user_id("u1"))
            .unwrap()
            .into_iter()
            .map(|o| o.order_id.to_string())
            .collect();
        assert_eq!(ids, vec!["o1", "o3"]);
        assert!(store.orders_for_user(&user_id("nobody")).unwrap().is_empty());
    }

    #[test]
    fn debug_format() {
        let store = InMemoryLedgerStore::default();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryLedgerStore"));
        assert!(debug.contains("order_count"));
    }
}
