//! API integration tests: drive the Axum router with in-memory requests
//! and assert on the JSON wire format.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use stakebook::api::build_router;
use stakebook::api::routes::ApiState;
use stakebook::engine::LedgerEngine;
use stakebook::storage::Storage;

fn test_router() -> Router {
    let mut p = std::env::temp_dir();
    p.push(format!("stakebook_apirt_{}", uuid::Uuid::new_v4()));
    let engine = LedgerEngine::new(Storage::new(p).unwrap());
    build_router(Arc::new(ApiState::new(engine)))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(v) => builder.body(Body::from(v.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_standard_account(router: &Router) {
    let (status, _) = send(
        router,
        Method::POST,
        "/api/accounts",
        Some(json!({
            "id": "main",
            "name": "Main challenge",
            "tier": "standard",
            "size": 10000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn health_is_ok() {
    let router = test_router();
    let (status, _) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn account_lifecycle_over_http() {
    let router = test_router();
    create_standard_account(&router).await;

    // Duplicate setup is rejected.
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/accounts",
        Some(json!({"id": "main", "name": "x", "tier": "pro", "size": 50000})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let (status, index) = send(&router, Method::GET, "/api/accounts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(index["main"]["tier"], "standard");
}

#[tokio::test]
async fn add_edit_delete_bet_over_http() {
    let router = test_router();
    create_standard_account(&router).await;

    let (status, added) = send(
        &router,
        Method::POST,
        "/api/accounts/main/bets",
        Some(json!({
            "date": "2026-03-01",
            "sport": "NFL",
            "selection": "Chiefs -3",
            "stake": 100,
            "odds": -110,
            "result": "WIN",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["new_balance"].as_f64().unwrap(), 10090.91);
    let bet_id = added["bet_id"].as_str().unwrap().to_string();

    let (status, edited) = send(
        &router,
        Method::PUT,
        &format!("/api/accounts/main/bets/{bet_id}"),
        Some(json!({
            "date": "2026-03-01",
            "sport": "NFL",
            "selection": "Chiefs -3",
            "stake": 100,
            "odds": -110,
            "result": "LOSS",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["new_balance"].as_f64().unwrap(), 9900.0);

    let (status, deleted) = send(
        &router,
        Method::DELETE,
        &format!("/api/accounts/main/bets/{bet_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["new_balance"].as_f64().unwrap(), 10000.0);

    // Deleting again → 404.
    let (status, _) = send(
        &router,
        Method::DELETE,
        &format!("/api/accounts/main/bets/{bet_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stake_gate_surfaces_limits_in_error() {
    let router = test_router();
    create_standard_account(&router).await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/accounts/main/bets",
        Some(json!({
            "date": "2026-03-01",
            "sport": "NFL",
            "selection": "Chiefs -3",
            "stake": 5000,
            "odds": -110,
            "result": "WIN",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains("Standard"));
    assert!(msg.contains("10000"));
}

#[tokio::test]
async fn csv_import_and_status_over_http() {
    let router = test_router();
    create_standard_account(&router).await;

    let csv = "Date,Sport,Selection,Stake,Odds,Result\n\
               2026-03-02,NBA,Lakers ML,150,+120,L\n\
               2026-03-01,NFL,Chiefs -3,100,-110,W\n\
               bad line";
    let (status, report) = send(
        &router,
        Method::POST,
        "/api/accounts/main/import",
        Some(json!({ "csv": csv })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["imported"], 2);
    assert_eq!(report["errors"], 1);

    let (status, s) = send(&router, Method::GET, "/api/accounts/main/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(s["phase"], "phase1");
    assert_eq!(s["total_bets"], 2);
    assert!(s["violations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v["type"] == "pick_minimum"));

    let (status, ledger) = send(&router, Method::GET, "/api/accounts/main/ledger", None).await;
    assert_eq!(status, StatusCode::OK);
    // Rows landed oldest-first regardless of paste order.
    assert_eq!(ledger["bets"][0]["date"], "2026-03-01");
}

#[tokio::test]
async fn advance_phase_and_clear_over_http() {
    let router = test_router();
    create_standard_account(&router).await;

    let (status, msg) = send(
        &router,
        Method::POST,
        "/api/accounts/main/advance-phase",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(msg["message"].as_str().unwrap().contains("Phase 2"));

    let (status, cleared) = send(&router, Method::POST, "/api/accounts/main/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["new_balance"].as_f64().unwrap(), 10000.0);
}
