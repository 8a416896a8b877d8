use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use gcl_classify::Classifier;
use gcl_ledger::StreakLedger;
use gcl_store::StoreBackend;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::GclConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{AppState, Ledger};
use crate::router::build_router;

/// GCL HTTP server.
pub struct GclServer {
    config: GclConfig,
    state: AppState,
}

impl GclServer {
    /// Open the configured store and classifier and build a server around
    /// them.
    pub fn open(config: GclConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = StoreBackend::open(config.store.path.as_deref())?;
        let ledger = StreakLedger::new(store, config.policy);
        let classifier = config.classifier.build();
        Ok(Self::new(config, Arc::new(ledger), classifier))
    }

    pub fn new(config: GclConfig, ledger: Arc<Ledger>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            config,
            state: AppState::new(ledger, classifier),
        }
    }

    pub fn config(&self) -> &GclConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let router = build_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.server.max_body_bytes));
        if self.config.server.allow_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.server.bind_addr).await?;
        tracing::info!(
            addr = %self.config.server.bind_addr,
            store = self.state.ledger.store().kind(),
            "GCL server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::util::ServiceExt;

    #[test]
    fn opens_in_memory_by_default() {
        let server = GclServer::open(GclConfig::default()).unwrap();
        assert_eq!(server.config().server.bind_addr.port(), 5000);
        assert_eq!(server.state.ledger.store().kind(), "memory");
    }

    #[test]
    fn opens_sqlite_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GclConfig::default();
        config.store.path = Some(dir.path().join("ledger.db"));
        let server = GclServer::open(config).unwrap();
        assert_eq!(server.state.ledger.store().kind(), "sqlite");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = GclConfig::default();
        config.policy.reward_threshold = -1.0;
        assert!(matches!(GclServer::open(config), Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn unreachable_model_is_covered_by_the_fallback() {
        let mut config = GclConfig::default();
        config.classifier.model = Some(gcl_classify::ModelConfig {
            api_url: "http://127.0.0.1:9".into(),
            model: "unreachable-model".into(),
            api_key_env: "GCL_SERVER_TEST_KEY_NEVER_SET".into(),
            timeout_secs: 1,
        });
        let server = GclServer::open(config).unwrap();
        assert_eq!(server.state.classifier.name(), "unreachable-model");

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title": "Bamboo toothbrush"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["used"], "fallback");
        assert_eq!(body["numericScore"], 4.0);
    }

    async fn preflight(server: &GclServer) -> axum::http::Response<Body> {
        server
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/update_order")
                    .header(header::ORIGIN, "chrome-extension://abc")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cors_preflight_is_answered_when_enabled() {
        let server = GclServer::open(GclConfig::default()).unwrap();
        let response = preflight(&server).await;
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn cors_can_be_disabled() {
        let mut config = GclConfig::default();
        config.server.allow_cors = false;
        let server = GclServer::open(config).unwrap();
        let response = preflight(&server).await;
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
