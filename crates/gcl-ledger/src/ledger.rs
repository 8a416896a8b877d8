use std::sync::Arc;

use gcl_store::{LedgerStore, Transaction};
use gcl_types::{Order, OrderId, RewardPolicy, UserAccount, UserId};
use tracing::{debug, info};

use crate::audit::{audit_account, AuditReport};
use crate::clock::{Clock, SystemClock};
use crate::engine::{self, Transition};
use crate::error::{LedgerError, LedgerResult};
use crate::locks::UserLocks;
use crate::request::{ReclassifyRequest, ReportOutcome, StatusReport};

/// The streak ledger: order upserts, engine transitions, and lookups over an
/// injected store.
///
/// Every mutating call takes the caller's per-user lock and runs inside one
/// store transaction, so an account and its orders always change together.
pub struct StreakLedger<S> {
    store: S,
    policy: RewardPolicy,
    clock: Arc<dyn Clock>,
    locks: UserLocks,
}

impl<S: LedgerStore> StreakLedger<S> {
    pub fn new(store: S, policy: RewardPolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, policy: RewardPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
            locks: UserLocks::new(),
        }
    }

    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a status report for an order and run the engine on it.
    ///
    /// The first report for an order creates it with the report's
    /// classification. Later reports change only its status and their
    /// classifier fields are ignored unchecked. Reports naming another user
    /// than the order's owner are rejected untouched.
    pub fn report(&self, report: StatusReport) -> LedgerResult<ReportOutcome> {
        let today = self.clock.today();

        let outcome = self.locks.with_user(&report.user_id, || {
            self.store.transact(|tx| -> LedgerResult<ReportOutcome> {
                let mut account = load_account(tx, &report.user_id)?;
                let existing = tx.order(&report.order_id)?;
                let is_new = existing.is_none();

                let mut order = match existing {
                    Some(mut order) => {
                        check_owner(&order, &report.user_id)?;
                        order.lifecycle_status = report.status;
                        order
                    }
                    None => {
                        report.classification.validate()?;
                        Order::new(
                            report.order_id.clone(),
                            report.user_id.clone(),
                            report.status,
                            report.classification.clone(),
                            &self.policy,
                            today,
                        )
                    }
                };

                let transition = engine::transition(&mut account, &mut order, today, &self.policy);

                if is_new {
                    tx.insert_order(&order)?;
                } else {
                    tx.update_order(&order)?;
                }
                tx.put_user(&account)?;

                Ok(ReportOutcome {
                    order,
                    account,
                    transition,
                })
            })
        })?;

        log_outcome("status report", &outcome);
        Ok(outcome)
    }

    /// Replace an existing order's classification and settle its effect.
    pub fn reclassify(&self, request: ReclassifyRequest) -> LedgerResult<ReportOutcome> {
        request.classification.validate()?;
        let today = self.clock.today();

        let outcome = self.locks.with_user(&request.user_id, || {
            self.store.transact(|tx| -> LedgerResult<ReportOutcome> {
                let mut order = tx
                    .order(&request.order_id)?
                    .ok_or_else(|| LedgerError::OrderNotFound(request.order_id.clone()))?;
                check_owner(&order, &request.user_id)?;
                let mut account = load_account(tx, &request.user_id)?;

                let transition = engine::reclassify(
                    &mut account,
                    &mut order,
                    request.classification.clone(),
                    today,
                    &self.policy,
                );

                tx.update_order(&order)?;
                tx.put_user(&account)?;

                Ok(ReportOutcome {
                    order,
                    account,
                    transition,
                })
            })
        })?;

        log_outcome("reclassification", &outcome);
        Ok(outcome)
    }

    pub fn account(&self, user_id: &UserId) -> LedgerResult<UserAccount> {
        self.store
            .user(user_id)?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.clone()))
    }

    pub fn order(&self, order_id: &OrderId) -> LedgerResult<Order> {
        self.store
            .order(order_id)?
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))
    }

    /// Orders owned by a user, sorted by id. Empty for unknown users.
    pub fn orders_for(&self, user_id: &UserId) -> LedgerResult<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id)?)
    }

    /// Check a user's account against their orders.
    pub fn audit(&self, user_id: &UserId) -> LedgerResult<AuditReport> {
        // Hold the user lock so the account and the orders come from the
        // same committed state.
        self.locks.with_user(user_id, || {
            let account = self.account(user_id)?;
            let orders = self.orders_for(user_id)?;
            Ok(audit_account(&account, &orders, &self.policy))
        })
    }
}

fn load_account(tx: &mut dyn Transaction, user_id: &UserId) -> LedgerResult<UserAccount> {
    Ok(tx
        .user(user_id)?
        .unwrap_or_else(|| UserAccount::new(user_id.clone())))
}

fn check_owner(order: &Order, claimed: &UserId) -> LedgerResult<()> {
    if &order.user_id != claimed {
        return Err(LedgerError::OwnerMismatch {
            order_id: order.order_id.clone(),
            owner: order.user_id.clone(),
            claimed: claimed.clone(),
        });
    }
    Ok(())
}

fn log_outcome(operation: &str, outcome: &ReportOutcome) {
    let ReportOutcome {
        order,
        account,
        transition,
    } = outcome;
    if *transition == Transition::NoOp {
        debug!(
            operation,
            user_id = %order.user_id,
            order_id = %order.order_id,
            status = %order.lifecycle_status,
            "no ledger effect"
        );
    } else {
        info!(
            operation,
            user_id = %order.user_id,
            order_id = %order.order_id,
            status = %order.lifecycle_status,
            transition = %transition,
            current_streak = account.current_streak,
            total_credit_score = account.total_credit_score,
            carbon_reward_count = account.carbon_reward_count,
            "applied ledger transition"
        );
    }
}
