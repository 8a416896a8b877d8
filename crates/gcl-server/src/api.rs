//! Request and response bodies of the HTTP API.
//!
//! Field names follow what the browser extension already sends:
//! `product_name` and `carbon_credits`, with `product_label` and
//! `credit_amount` accepted as aliases.

use gcl_ledger::{ReclassifyRequest, ReportOutcome, StatusReport, Transition};
use gcl_types::{Classification, Order, OrderId, UserAccount, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ServerResult;

/// Body of `POST /update_order`.
#[derive(Clone, Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub order_id: String,
    pub user_id: String,
    pub status: String,
    #[serde(default, alias = "product_label")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub sustainability_score: Option<f64>,
    #[serde(default, alias = "credit_amount")]
    pub carbon_credits: Option<f64>,
}

impl UpdateOrderRequest {
    pub fn into_report(self) -> ServerResult<StatusReport> {
        let classification = Classification {
            product_label: self.product_name,
            sustainability_score: self.sustainability_score,
            credit_amount: self.carbon_credits,
        };
        Ok(StatusReport::parse(&self.order_id, &self.user_id, &self.status)?
            .with_classification(classification))
    }
}

/// Body of `POST /reclassify`.
#[derive(Clone, Debug, Deserialize)]
pub struct ReclassifyBody {
    pub order_id: String,
    pub user_id: String,
    #[serde(default, alias = "product_label")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub sustainability_score: Option<f64>,
    #[serde(default, alias = "credit_amount")]
    pub carbon_credits: Option<f64>,
}

impl ReclassifyBody {
    pub fn into_request(self) -> ServerResult<ReclassifyRequest> {
        Ok(ReclassifyRequest::new(
            OrderId::new(&self.order_id)?,
            UserId::new(&self.user_id)?,
            Classification {
                product_label: self.product_name,
                sustainability_score: self.sustainability_score,
                credit_amount: self.carbon_credits,
            },
        ))
    }
}

/// Result of a status report or reclassification.
#[derive(Clone, Debug, Serialize)]
pub struct OrderUpdateResponse {
    pub order: Order,
    pub user: UserAccount,
    pub transition: Transition,
    /// `true` when this call awarded the order.
    pub streak_awarded: bool,
    pub current_streak: u32,
    pub total_credits: f64,
}

impl From<ReportOutcome> for OrderUpdateResponse {
    fn from(outcome: ReportOutcome) -> Self {
        Self {
            streak_awarded: outcome.transition == Transition::Award,
            current_streak: outcome.account.current_streak,
            total_credits: outcome.account.total_credit_score,
            transition: outcome.transition,
            order: outcome.order,
            user: outcome.account,
        }
    }
}

/// Query of `GET /user_streak`.
#[derive(Clone, Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

/// Body of `GET /user_streak`.
#[derive(Clone, Debug, Serialize)]
pub struct UserStreakResponse {
    pub user_id: UserId,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_credits: f64,
    pub carbon_reward_count: u32,
    pub last_award_date: Option<chrono::NaiveDate>,
}

impl From<UserAccount> for UserStreakResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            user_id: account.user_id,
            current_streak: account.current_streak,
            longest_streak: account.longest_streak,
            total_credits: account.total_credit_score,
            carbon_reward_count: account.carbon_reward_count,
            last_award_date: account.last_award_date,
        }
    }
}

/// Body of `POST /analyze`, as sent by the browser extension.
///
/// Either `text`, or any of the product page fields, which are joined.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub text: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl AnalyzeRequest {
    pub fn text(&self) -> String {
        [&self.text, &self.title, &self.description, &self.url]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
