//! SQLite persistence for the ledger.
//!
//! Only this module talks to the database. One connection is shared behind a
//! mutex; every [`LedgerStore::transact`] call runs inside an `IMMEDIATE`
//! transaction that commits only when the closure succeeds and rolls back on
//! drop otherwise.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use gcl_types::{Order, OrderId, OrderStatus, UserAccount, UserId};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::{LedgerStore, Transaction};

const ORDER_COLUMNS: &str = "order_id, user_id, product_label, lifecycle_status, \
     sustainability_score, credit_amount, is_sustainable, created_date, award_applied";

const USER_COLUMNS: &str = "user_id, current_streak, longest_streak, last_award_date, \
     total_credit_score, carbon_reward_count";

/// SQLite-backed ledger store.
pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteLedgerStore {
    /// Open (or create) the ledger database at `path` and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        // WAL is unavailable for some filesystems; the store works without it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.migrate()?;
        info!(path = %path.display(), "opened sqlite ledger store");
        Ok(store)
    }

    /// Open a private in-memory database (used in tests and one-shot runs).
    pub fn in_memory() -> StoreResult<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Database file backing this store, `None` when in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> StoreResult<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(include_str!("../migrations/001_ledger.sql"))?;
        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn user(&self, id: &UserId) -> StoreResult<Option<UserAccount>> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        select_user(&conn, id)
    }

    fn order(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        select_order(&conn, id)
    }

    fn orders_for_user(&self, id: &UserId) -> StoreResult<Vec<Order>> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY order_id ASC"
        ))?;
        let raws = stmt
            .query_map(params![id.as_str()], RawOrder::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawOrder::into_order).collect()
    }

    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| E::from(StoreError::Poisoned))?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(StoreError::from(e)))?;
        let out = f(&mut SqliteTransaction { conn: &*tx })?;
        tx.commit().map_err(|e| E::from(StoreError::from(e)))?;
        debug!("sqlite transaction committed");
        Ok(out)
    }
}

impl std::fmt::Debug for SqliteLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedgerStore")
            .field("path", &self.path)
            .finish()
    }
}

/// Statement-level view over an open rusqlite transaction.
struct SqliteTransaction<'a> {
    conn: &'a Connection,
}

impl Transaction for SqliteTransaction<'_> {
    fn user(&mut self, id: &UserId) -> StoreResult<Option<UserAccount>> {
        select_user(self.conn, id)
    }

    fn order(&mut self, id: &OrderId) -> StoreResult<Option<Order>> {
        select_order(self.conn, id)
    }

    fn put_user(&mut self, account: &UserAccount) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO users (user_id, current_streak, longest_streak, last_award_date,
                                total_credit_score, carbon_reward_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id) DO UPDATE SET
                current_streak      = excluded.current_streak,
                longest_streak      = excluded.longest_streak,
                last_award_date     = excluded.last_award_date,
                total_credit_score  = excluded.total_credit_score,
                carbon_reward_count = excluded.carbon_reward_count",
            params![
                account.user_id.as_str(),
                account.current_streak,
                account.longest_streak,
                account.last_award_date,
                account.total_credit_score,
                account.carbon_reward_count,
            ],
        )?;
        Ok(())
    }

    fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        let result = self.conn.execute(
            &format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                order.order_id.as_str(),
                order.user_id.as_str(),
                order.product_label,
                order.lifecycle_status.as_str(),
                order.sustainability_score,
                order.credit_amount,
                order.is_sustainable,
                order.created_date,
                order.award_applied,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::Conflict {
                    entity: "order",
                    key: order.order_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_order(&mut self, order: &Order) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE orders SET
                product_label        = ?2,
                lifecycle_status     = ?3,
                sustainability_score = ?4,
                credit_amount        = ?5,
                is_sustainable       = ?6,
                award_applied        = ?7
             WHERE order_id = ?1",
            params![
                order.order_id.as_str(),
                order.product_label,
                order.lifecycle_status.as_str(),
                order.sustainability_score,
                order.credit_amount,
                order.is_sustainable,
                order.award_applied,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::Conflict {
                entity: "order",
                key: order.order_id.to_string(),
            });
        }
        Ok(())
    }
}

// ── Row decoding ─────────────────────────────────────────────

fn select_user(conn: &Connection, id: &UserId) -> StoreResult<Option<UserAccount>> {
    let raw = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            params![id.as_str()],
            RawUser::from_row,
        )
        .optional()?;
    raw.map(RawUser::into_account).transpose()
}

fn select_order(conn: &Connection, id: &OrderId) -> StoreResult<Option<Order>> {
    let raw = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1"),
            params![id.as_str()],
            RawOrder::from_row,
        )
        .optional()?;
    raw.map(RawOrder::into_order).transpose()
}

struct RawUser {
    user_id: String,
    current_streak: u32,
    longest_streak: u32,
    last_award_date: Option<NaiveDate>,
    total_credit_score: f64,
    carbon_reward_count: u32,
}

impl RawUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            current_streak: row.get(1)?,
            longest_streak: row.get(2)?,
            last_award_date: row.get(3)?,
            total_credit_score: row.get(4)?,
            carbon_reward_count: row.get(5)?,
        })
    }

    fn into_account(self) -> StoreResult<UserAccount> {
        let user_id = UserId::new(&self.user_id).map_err(|e| StoreError::CorruptRow {
            entity: "user",
            key: self.user_id.clone(),
            reason: e.to_string(),
        })?;
        Ok(UserAccount {
            user_id,
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            total_credit_score: self.total_credit_score,
            carbon_reward_count: self.carbon_reward_count,
            last_award_date: self.last_award_date,
        })
    }
}

struct RawOrder {
    order_id: String,
    user_id: String,
    product_label: Option<String>,
    lifecycle_status: String,
    sustainability_score: Option<f64>,
    credit_amount: Option<f64>,
    is_sustainable: bool,
    created_date: NaiveDate,
    award_applied: bool,
}

impl RawOrder {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            order_id: row.get(0)?,
            user_id: row.get(1)?,
            product_label: row.get(2)?,
            lifecycle_status: row.get(3)?,
            sustainability_score: row.get(4)?,
            credit_amount: row.get(5)?,
            is_sustainable: row.get(6)?,
            created_date: row.get(7)?,
            award_applied: row.get(8)?,
        })
    }

    fn into_order(self) -> StoreResult<Order> {
        let corrupt = |reason: String| StoreError::CorruptRow {
            entity: "order",
            key: self.order_id.clone(),
            reason,
        };
        let order_id = OrderId::new(&self.order_id).map_err(|e| corrupt(e.to_string()))?;
        let user_id = UserId::new(&self.user_id).map_err(|e| corrupt(e.to_string()))?;
        let lifecycle_status: OrderStatus = self
            .lifecycle_status
            .parse()
            .map_err(|e: gcl_types::TypeError| corrupt(e.to_string()))?;
        Ok(Order {
            order_id,
            user_id,
            product_label: self.product_label,
            lifecycle_status,
            sustainability_score: self.sustainability_score,
            credit_amount: self.credit_amount,
            is_sustainable: self.is_sustainable,
            award_applied: self.award_applied,
            created_date: self.created_date,
        })
    }
}
