use gcl_types::{Classification, Order, OrderId, OrderStatus, UserAccount, UserId};
use serde::{Deserialize, Serialize};

use crate::engine::Transition;
use crate::error::LedgerResult;

/// A storefront report that an order moved to a new lifecycle status.
///
/// The classification is only used when the order is first seen; later
/// reports for the same order change its status alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    #[serde(default)]
    pub classification: Classification,
}

impl StatusReport {
    pub fn new(order_id: OrderId, user_id: UserId, status: OrderStatus) -> Self {
        Self {
            order_id,
            user_id,
            status,
            classification: Classification::default(),
        }
    }

    /// Parse raw identifiers and status, as received at a boundary.
    pub fn parse(order_id: &str, user_id: &str, status: &str) -> LedgerResult<Self> {
        Ok(Self::new(
            OrderId::new(order_id)?,
            UserId::new(user_id)?,
            status.parse()?,
        ))
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn with_score(mut self, sustainability_score: f64, credit_amount: f64) -> Self {
        self.classification.sustainability_score = Some(sustainability_score);
        self.classification.credit_amount = Some(credit_amount);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.classification.product_label = Some(label.into());
        self
    }
}

/// An explicit request to replace an existing order's classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReclassifyRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub classification: Classification,
}

impl ReclassifyRequest {
    pub fn new(order_id: OrderId, user_id: UserId, classification: Classification) -> Self {
        Self {
            order_id,
            user_id,
            classification,
        }
    }
}

/// Records as committed by a ledger call, plus the rule that fired.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub order: Order,
    pub account: UserAccount,
    pub transition: Transition,
}
