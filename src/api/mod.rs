//! JSON API — Axum web server exposing the ledger engine.
//!
//! Rendering is a client concern; this server speaks JSON only.
//! CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/accounts", get(routes::list_accounts))
        .route("/api/accounts", post(routes::create_account))
        .route("/api/accounts/:id/status", get(routes::get_status))
        .route("/api/accounts/:id/ledger", get(routes::get_ledger))
        .route("/api/accounts/:id/bets", post(routes::add_bet))
        .route("/api/accounts/:id/bets/:bet_id", put(routes::edit_bet))
        .route("/api/accounts/:id/bets/:bet_id", delete(routes::delete_bet))
        .route("/api/accounts/:id/clear", post(routes::clear_account))
        .route("/api/accounts/:id/import", post(routes::import_csv))
        .route("/api/accounts/:id/advance-phase", post(routes::advance_phase))
        .layer(cors)
        .with_state(state)
}

/// Serve the API until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "API server starting on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    axum::serve(listener, app).await.context("API server error")
}
