use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use gcl_classify::{Assessment, Classifier};
use gcl_ledger::StreakLedger;
use gcl_store::StoreBackend;
use gcl_types::{Order, OrderId, UserId};
use serde_json::json;

use crate::api::{
    AnalyzeRequest, HealthResponse, OrderUpdateResponse, ReclassifyBody, UpdateOrderRequest,
    UserQuery, UserStreakResponse,
};
use crate::error::{ServerError, ServerResult};

pub type Ledger = StreakLedger<StoreBackend>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, classifier: Arc<dyn Classifier>) -> Self {
        Self { ledger, classifier }
    }

    /// Run a ledger call off the async runtime. Ledger calls take locks and
    /// may hit the disk.
    async fn blocking<T, F>(&self, f: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Ledger) -> ServerResult<T> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        tokio::task::spawn_blocking(move || f(&ledger))
            .await
            .map_err(|e| ServerError::Internal(format!("ledger task failed: {e}")))?
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let policy = state.ledger.policy();
    Json(json!({
        "name": "gcl-server",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.ledger.store().kind(),
        "classifier": state.classifier.name(),
        "sustainable_threshold": policy.sustainable_threshold,
        "reward_threshold": policy.reward_threshold,
    }))
}

/// `POST /update_order`: record a status report and run the engine.
pub async fn update_order_handler(
    State(state): State<AppState>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> ServerResult<Json<OrderUpdateResponse>> {
    let report = body(payload)?.into_report()?;
    let outcome = state
        .blocking(move |ledger| Ok(ledger.report(report)?))
        .await?;
    Ok(Json(outcome.into()))
}

/// `POST /reclassify`: replace an order's classification.
pub async fn reclassify_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReclassifyBody>, JsonRejection>,
) -> ServerResult<Json<OrderUpdateResponse>> {
    let request = body(payload)?.into_request()?;
    let outcome = state
        .blocking(move |ledger| Ok(ledger.reclassify(request)?))
        .await?;
    Ok(Json(outcome.into()))
}

/// `GET /user_streak?user_id=`
pub async fn user_streak_handler(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ServerResult<Json<UserStreakResponse>> {
    let Query(query) = query.map_err(|r| ServerError::BadRequest(r.body_text()))?;
    let user_id = UserId::new(&query.user_id)?;
    let account = state
        .blocking(move |ledger| Ok(ledger.account(&user_id)?))
        .await?;
    Ok(Json(account.into()))
}

/// `GET /orders/:order_id`
pub async fn order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ServerResult<Json<Order>> {
    let order_id = OrderId::new(&order_id)?;
    let order = state
        .blocking(move |ledger| Ok(ledger.order(&order_id)?))
        .await?;
    Ok(Json(order))
}

/// `GET /users/:user_id/orders`
pub async fn user_orders_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ServerResult<Json<Vec<Order>>> {
    let user_id = UserId::new(&user_id)?;
    let orders = state
        .blocking(move |ledger| Ok(ledger.orders_for(&user_id)?))
        .await?;
    Ok(Json(orders))
}

/// `POST /analyze`: score product text. Classifier failures are absorbed
/// by the fallback heuristic and never reach the client.
pub async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ServerResult<Json<Assessment>> {
    let text = body(payload)?.text();
    let assessment = state
        .classifier
        .classify(&text)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Json(assessment))
}
