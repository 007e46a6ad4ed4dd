use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use trustchain_api::config::ServerConfig;
use trustchain_api::router::build_app_router;
use trustchain_api::state::AppState;
use trustchain_core::config::EngineConfig;
use trustchain_events::EventBus;
use trustchain_pipeline::{NeutralScoring, NoopLedger, ScoringProvider, SubmissionPipeline};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and the default engine configuration.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        engine: EngineConfig::default(),
        scoring_url: None,
        scoring_timeout: Duration::from_secs(5),
        ledger_url: None,
        ledger_timeout: Duration::from_secs(5),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and neutral scoring.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_scoring(pool, Arc::new(NeutralScoring))
}

/// Same as [`build_test_app`] but with a custom scoring provider, for
/// degraded-path tests.
pub fn build_test_app_with_scoring(pool: PgPool, scoring: Arc<dyn ScoringProvider>) -> Router {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());

    let pipeline = Arc::new(SubmissionPipeline::new(
        pool.clone(),
        config.engine,
        scoring,
        Arc::clone(&event_bus),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        pipeline,
        ledger: Arc::new(NoopLedger),
        event_bus,
    };

    build_app_router(state, &config)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds"),
    )
    .await
    .expect("request succeeds")
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
    )
    .await
    .expect("request succeeds")
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is valid JSON")
}
