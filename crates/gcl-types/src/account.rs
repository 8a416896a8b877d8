use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Per-user streak and credit aggregate.
///
/// Created lazily the first time a user is referenced on a write path and
/// never deleted. `longest_streak` and `carbon_reward_count` are high-water
/// marks: they only ever rise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: UserId,
    /// Consecutive sustainable deliveries not yet broken or reverted.
    pub current_streak: u32,
    /// Highest `current_streak` ever reached.
    pub longest_streak: u32,
    /// Accumulated credit, never below zero.
    pub total_credit_score: f64,
    /// Rewards unlocked so far; ratchets upward with the credit total.
    pub carbon_reward_count: u32,
    /// Date of the most recent award.
    pub last_award_date: Option<NaiveDate>,
}

impl UserAccount {
    /// A fresh account with all counters at zero.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            total_credit_score: 0.0,
            carbon_reward_count: 0,
            last_award_date: None,
        }
    }

    /// Returns `true` if the account's structural invariants hold.
    pub fn is_consistent(&self) -> bool {
        self.longest_streak >= self.current_streak && self.total_credit_score >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_zeroed() {
        let account = UserAccount::new(UserId::new("u1").unwrap());
        assert_eq!(account.current_streak, 0);
        assert_eq!(account.longest_streak, 0);
        assert_eq!(account.total_credit_score, 0.0);
        assert_eq!(account.carbon_reward_count, 0);
        assert!(account.last_award_date.is_none());
        assert!(account.is_consistent());
    }

    #[test]
    fn inconsistent_when_streak_exceeds_high_water_mark() {
        let mut account = UserAccount::new(UserId::new("u1").unwrap());
        account.current_streak = 2;
        account.longest_streak = 1;
        assert!(!account.is_consistent());
    }
}
