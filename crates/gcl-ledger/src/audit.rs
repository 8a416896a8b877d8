use gcl_types::{Order, RewardPolicy, UserAccount, UserId};

/// Slack allowed when comparing accumulated floating-point credit.
const CREDIT_EPSILON: f64 = 1e-9;

/// Result of checking one user's account against their orders.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditReport {
    pub user_id: UserId,
    pub order_count: usize,
    /// Orders whose ledger effect is currently applied as an award.
    pub active_awards: usize,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific inconsistency found during an audit.
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    StreakAboveHighWater,
    NegativeCredit,
    RewardsBelowCredit,
    StreakExceedsAwards,
    CreditExceedsAwards,
    ForeignOrder,
}

/// Check an account's invariants and its consistency with the user's orders.
///
/// The streak can never exceed the number of sustainable orders whose award
/// is in effect, and the credit total can never exceed their summed credit:
/// reverts and resets only ever push the account below those bounds.
pub fn audit_account(account: &UserAccount, orders: &[Order], policy: &RewardPolicy) -> AuditReport {
    let mut violations = Vec::new();
    let mut flag = |kind, description: String| violations.push(Violation { kind, description });

    if account.current_streak > account.longest_streak {
        flag(
            ViolationKind::StreakAboveHighWater,
            format!(
                "current streak {} above longest streak {}",
                account.current_streak, account.longest_streak
            ),
        );
    }

    if !(account.total_credit_score.is_finite() && account.total_credit_score >= 0.0) {
        flag(
            ViolationKind::NegativeCredit,
            format!("credit score {} is not a non-negative number", account.total_credit_score),
        );
    }

    let owed = policy.rewards_for(account.total_credit_score);
    if account.carbon_reward_count < owed {
        flag(
            ViolationKind::RewardsBelowCredit,
            format!(
                "{} rewards recorded but credit {} is worth {owed}",
                account.carbon_reward_count, account.total_credit_score
            ),
        );
    }

    for order in orders.iter().filter(|o| o.user_id != account.user_id) {
        flag(
            ViolationKind::ForeignOrder,
            format!("order {} is owned by {}", order.order_id, order.user_id),
        );
    }

    let awarded: Vec<&Order> = orders
        .iter()
        .filter(|o| o.user_id == account.user_id && o.award_applied && o.is_sustainable)
        .collect();
    let awarded_credit: f64 = awarded.iter().map(|o| o.credit()).sum();

    if account.current_streak as usize > awarded.len() {
        flag(
            ViolationKind::StreakExceedsAwards,
            format!(
                "current streak {} exceeds {} active awards",
                account.current_streak,
                awarded.len()
            ),
        );
    }

    if account.total_credit_score > awarded_credit + CREDIT_EPSILON {
        flag(
            ViolationKind::CreditExceedsAwards,
            format!(
                "credit score {} exceeds {awarded_credit} credited by active awards",
                account.total_credit_score
            ),
        );
    }

    AuditReport {
        user_id: account.user_id.clone(),
        order_count: orders.len(),
        active_awards: awarded.len(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gcl_types::{Classification, OrderId, OrderStatus};

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn awarded_order(id: &str, credit: f64) -> Order {
        let mut order = Order::new(
            OrderId::new(id).unwrap(),
            user(),
            OrderStatus::Delivered,
            Classification {
                product_label: None,
                sustainability_score: Some(7.0),
                credit_amount: Some(credit),
            },
            &RewardPolicy::default(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        order.award_applied = true;
        order
    }

    fn kinds(report: &AuditReport) -> Vec<ViolationKind> {
        report.violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn consistent_account_is_clean() {
        let mut account = UserAccount::new(user());
        account.current_streak = 2;
        account.longest_streak = 4;
        account.total_credit_score = 9.0;
        account.carbon_reward_count = 3;
        let orders = vec![awarded_order("a", 4.0), awarded_order("b", 5.0)];

        let report = audit_account(&account, &orders, &RewardPolicy::default());
        assert!(report.is_clean(), "{:?}", report.violations);
        assert_eq!(report.active_awards, 2);
        assert_eq!(report.order_count, 2);
    }

    #[test]
    fn detects_broken_high_water_mark_and_rewards() {
        let mut account = UserAccount::new(user());
        account.current_streak = 1;
        account.longest_streak = 0;
        account.total_credit_score = 10.0;
        account.carbon_reward_count = 1;
        let orders = vec![awarded_order("a", 10.0)];

        let report = audit_account(&account, &orders, &RewardPolicy::default());
        assert_eq!(
            kinds(&report),
            vec![ViolationKind::StreakAboveHighWater, ViolationKind::RewardsBelowCredit]
        );
    }

    #[test]
    fn detects_double_counted_award() {
        let mut account = UserAccount::new(user());
        account.current_streak = 2;
        account.longest_streak = 2;
        account.total_credit_score = 12.0;
        account.carbon_reward_count = 2;
        let orders = vec![awarded_order("a", 6.0)];

        let report = audit_account(&account, &orders, &RewardPolicy::default());
        assert_eq!(
            kinds(&report),
            vec![ViolationKind::StreakExceedsAwards, ViolationKind::CreditExceedsAwards]
        );
    }

    #[test]
    fn detects_foreign_orders_and_negative_credit() {
        let mut account = UserAccount::new(user());
        account.total_credit_score = -1.0;
        let mut foreign = awarded_order("x", 0.0);
        foreign.user_id = UserId::new("mallory").unwrap();

        let report = audit_account(&account, &[foreign], &RewardPolicy::default());
        assert_eq!(
            kinds(&report),
            vec![ViolationKind::NegativeCredit, ViolationKind::ForeignOrder]
        );
    }
}
