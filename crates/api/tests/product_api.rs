//! Integration tests for product registration, retrieval, and ledger
//! status.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use sqlx::PgPool;

async fn register(app: axum::Router) -> serde_json::Value {
    let response = post_json(
        app,
        "/api/v1/product/register",
        serde_json::json!({
            "batch_id": "batch-1",
            "manufacturer_id": "mfg-1",
            "product_metadata": {"name": "Coffee 1kg", "origin": "Colombia"},
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn register_creates_product_with_defaults(pool: PgPool) {
    let app = common::build_test_app(pool);
    let product = register(app).await;

    let product_id = product["product_id"].as_str().unwrap();
    assert!(product_id.starts_with("prod-"));
    assert_eq!(product["batch_id"], "batch-1");
    assert_eq!(product["status"], "VALID");
    assert_eq!(product["trust_score"], 0.0);
    assert!(product["dkg_ual"].is_null(), "UAL set only after ledger sync");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_empty_batch_id(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/product/register",
        serde_json::json!({"batch_id": "", "manufacturer_id": "mfg-1"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_out_of_range_trust_score(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/product/register",
        serde_json::json!({
            "batch_id": "batch-1",
            "manufacturer_id": "mfg-1",
            "trust_score": 1.5,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn get_product_roundtrip(pool: PgPool) {
    let app = common::build_test_app(pool);
    let product = register(app.clone()).await;
    let product_id = product["product_id"].as_str().unwrap();

    let response = get(app, &format!("/api/v1/product/{product_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["product_id"], *product_id);
    assert_eq!(json["data"]["product_metadata"]["origin"], "Colombia");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_unknown_product_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/product/prod-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn timeline_of_fresh_product_is_empty(pool: PgPool) {
    let app = common::build_test_app(pool);
    let product = register(app.clone()).await;
    let product_id = product["product_id"].as_str().unwrap();

    let response = get(app, &format!("/api/v1/product/{product_id}/timeline")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Ledger status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn registration_enqueues_a_ledger_publish(pool: PgPool) {
    let app = common::build_test_app(pool);
    let product = register(app.clone()).await;
    let product_id = product["product_id"].as_str().unwrap();

    let response = get(app, &format!("/api/v1/dkg/{product_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["pending_jobs"], 1);
    assert_eq!(json["data"]["jobs"][0]["operation"], "publish");
    assert!(json["data"]["ual"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn asset_query_before_publish_returns_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    let product = register(app.clone()).await;
    let product_id = product["product_id"].as_str().unwrap();

    let response = get(app, &format!("/api/v1/dkg/{product_id}/asset")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
