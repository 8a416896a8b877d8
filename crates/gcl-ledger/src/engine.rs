//! The streak/reward transition function.
//!
//! Everything here is pure: it mutates the account and order handed to it
//! and never touches storage. Callers load both records inside one store
//! transaction, run a transition, and write both back.
//!
//! Rules for a status report, keyed on the order's persisted
//! `(lifecycle_status, is_sustainable, award_applied)`:
//!
//! | status                          | sustainable | applied | rule   |
//! |---------------------------------|-------------|---------|--------|
//! | delivered                       | yes         | no      | AWARD  |
//! | delivered                       | no          | no      | RESET  |
//! | cancelled / returned / refunded | any         | yes     | REVERT |
//! | anything else                   | any         | any     | NO-OP  |
//!
//! A REVERT of a reset order only clears its flag: the reset carried no
//! credit and the broken streak is not restored.

use std::fmt;

use chrono::NaiveDate;
use gcl_types::{Classification, Order, OrderStatus, RewardPolicy, UserAccount};
use serde::{Deserialize, Serialize};

/// Which rule a call applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Streak extended and credit added.
    Award,
    /// Streak broken by a non-sustainable delivery.
    Reset,
    /// A previously applied effect was undone.
    Revert,
    /// Nothing changed on the account.
    NoOp,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Award => "award",
            Self::Reset => "reset",
            Self::Revert => "revert",
            Self::NoOp => "no_op",
        }
    }

    /// Returns `true` if the account may have changed.
    pub fn is_effective(&self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply the rule matching the order's current status and award flag.
///
/// `order.lifecycle_status` must already hold the newly reported status.
/// Decisions depend only on persisted state, never on report arrival order,
/// so replaying the same report is a no-op.
pub fn transition(
    account: &mut UserAccount,
    order: &mut Order,
    today: NaiveDate,
    policy: &RewardPolicy,
) -> Transition {
    match (order.lifecycle_status, order.is_sustainable, order.award_applied) {
        (OrderStatus::Delivered, true, false) => {
            apply_award(account, order.credit(), today, policy);
            order.award_applied = true;
            Transition::Award
        }
        (OrderStatus::Delivered, false, false) => {
            account.current_streak = 0;
            order.award_applied = true;
            Transition::Reset
        }
        (status, sustainable, true) if status.is_reversal() => {
            if sustainable {
                revert_award(account, order.credit());
            }
            order.award_applied = false;
            Transition::Revert
        }
        _ => Transition::NoOp,
    }
}

/// Swap an order's classification and settle the account under the new one.
///
/// An order whose effect is not applied only gets its fields replaced. If an
/// award is in effect it is reverted with the old credit and then either
/// re-awarded with the new credit or turned into a reset. If a reset is in
/// effect, a now-sustainable classification earns the award. `award_applied`
/// is left as it was.
pub fn reclassify(
    account: &mut UserAccount,
    order: &mut Order,
    classification: Classification,
    today: NaiveDate,
    policy: &RewardPolicy,
) -> Transition {
    let had_effect = order.award_applied;
    let was_award = had_effect && order.is_sustainable;
    let old_credit = order.credit();
    order.set_classification(classification, policy);

    match (had_effect, was_award, order.is_sustainable) {
        (false, _, _) => Transition::NoOp,
        (true, true, true) => {
            revert_award(account, old_credit);
            apply_award(account, order.credit(), today, policy);
            Transition::Award
        }
        (true, true, false) => {
            revert_award(account, old_credit);
            account.current_streak = 0;
            Transition::Reset
        }
        (true, false, true) => {
            apply_award(account, order.credit(), today, policy);
            Transition::Award
        }
        (true, false, false) => Transition::NoOp,
    }
}

fn apply_award(account: &mut UserAccount, credit: f64, today: NaiveDate, policy: &RewardPolicy) {
    account.current_streak = account.current_streak.saturating_add(1);
    account.longest_streak = account.longest_streak.max(account.current_streak);
    account.total_credit_score += credit;
    ratchet_rewards(account, policy);
    account.last_award_date = Some(today);
}

// Leaves the streak high-water mark and the reward count untouched.
fn revert_award(account: &mut UserAccount, credit: f64) {
    account.total_credit_score = (account.total_credit_score - credit).max(0.0);
    account.current_streak = account.current_streak.saturating_sub(1);
}

fn ratchet_rewards(account: &mut UserAccount, policy: &RewardPolicy) {
    account.carbon_reward_count = account
        .carbon_reward_count
        .max(policy.rewards_for(account.total_credit_score));
}
