use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{OrderId, UserId};
use crate::policy::RewardPolicy;
use crate::status::OrderStatus;

/// Classifier output attached to an order.
///
/// All fields are optional: a missing score means "not sustainable" and a
/// missing credit amount counts as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub product_label: Option<String>,
    pub sustainability_score: Option<f64>,
    pub credit_amount: Option<f64>,
}

impl Classification {
    /// Reject non-finite scores and negative or non-finite credit.
    pub fn validate(&self) -> Result<(), TypeError> {
        if let Some(score) = self.sustainability_score {
            if !score.is_finite() {
                return Err(TypeError::InvalidAmount {
                    field: "sustainability_score",
                    reason: "must be finite".into(),
                });
            }
        }
        if let Some(credit) = self.credit_amount {
            if !credit.is_finite() || credit < 0.0 {
                return Err(TypeError::InvalidAmount {
                    field: "credit_amount",
                    reason: format!("must be a non-negative finite number, got {credit}"),
                });
            }
        }
        Ok(())
    }
}

/// Ledger record for a single order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Owner, fixed at creation.
    pub user_id: UserId,
    pub product_label: Option<String>,
    pub lifecycle_status: OrderStatus,
    pub sustainability_score: Option<f64>,
    pub credit_amount: Option<f64>,
    /// Derived from `sustainability_score` at classification time.
    pub is_sustainable: bool,
    /// `true` while this order's ledger effect is applied and not reverted.
    pub award_applied: bool,
    pub created_date: NaiveDate,
}

impl Order {
    /// Create an order on its first status report.
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        status: OrderStatus,
        classification: Classification,
        policy: &RewardPolicy,
        created_date: NaiveDate,
    ) -> Self {
        let mut order = Self {
            order_id,
            user_id,
            product_label: None,
            lifecycle_status: status,
            sustainability_score: None,
            credit_amount: None,
            is_sustainable: false,
            award_applied: false,
            created_date,
        };
        order.set_classification(classification, policy);
        order
    }

    /// Credit this order contributes, zero when unclassified.
    pub fn credit(&self) -> f64 {
        self.credit_amount.unwrap_or(0.0)
    }

    /// The classifier fields currently stored on the order.
    pub fn classification(&self) -> Classification {
        Classification {
            product_label: self.product_label.clone(),
            sustainability_score: self.sustainability_score,
            credit_amount: self.credit_amount,
        }
    }

    /// Replace the classifier fields and recompute `is_sustainable`.
    ///
    /// Does not touch `award_applied`; callers that re-classify an order with
    /// an applied effect must settle the account themselves.
    pub fn set_classification(&mut self, classification: Classification, policy: &RewardPolicy) {
        self.is_sustainable = policy.is_sustainable(classification.sustainability_score);
        self.product_label = classification.product_label;
        self.sustainability_score = classification.sustainability_score;
        self.credit_amount = classification.credit_amount;
    }
}
