use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all GCL endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/update_order", post(handler::update_order_handler))
        .route("/reclassify", post(handler::reclassify_handler))
        .route("/user_streak", get(handler::user_streak_handler))
        .route("/orders/:order_id", get(handler::order_handler))
        .route("/users/:user_id/orders", get(handler::user_orders_handler))
        .route("/analyze", post(handler::analyze_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
