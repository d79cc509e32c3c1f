//! JSON API route handlers.
//!
//! All endpoints return JSON; the engine's domain errors map onto HTTP
//! statuses here and nowhere else. State is shared via `Arc<ApiState>`.
//! Mutations hold a per-account lock across the whole
//! load→mutate→persist sequence so concurrent requests against one
//! account serialize instead of racing the JSON documents.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::engine::{BetPatch, LedgerEngine, NewBet};
use crate::ingest;
use crate::types::{
    AccountStatus, AccountTier, AccountsIndex, BetAdded, BetResult, ImportReport, Ledger,
    LedgerError, ParlayLeg,
};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct ApiState {
    pub engine: LedgerEngine,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ApiState {
    pub fn new(engine: LedgerEngine) -> Self {
        Self {
            engine,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The mutex guarding one account's documents.
    async fn account_lock(&self, account_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

pub type AppState = Arc<ApiState>;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ---------------------------------------------------------------------------
// Error translation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::StakeOutOfRange { .. }
            | LedgerError::InvalidData(_)
            | LedgerError::InvalidResult(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub id: String,
    pub name: String,
    pub tier: AccountTier,
    pub size: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AddBetRequest {
    pub date: NaiveDate,
    pub sport: String,
    pub selection: String,
    pub stake: Decimal,
    #[serde(default)]
    pub odds: i64,
    pub result: BetResult,
    #[serde(default)]
    pub is_parlay: bool,
    #[serde(default)]
    pub parlay_legs: Vec<ParlayLeg>,
}

#[derive(Debug, Deserialize)]
pub struct EditBetRequest {
    pub date: NaiveDate,
    pub sport: String,
    pub selection: String,
    pub stake: Decimal,
    pub odds: i64,
    pub result: BetResult,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub csv: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub new_balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/accounts
pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<AccountsIndex>, ApiError> {
    Ok(Json(state.engine.list_accounts()?))
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let lock = state.account_lock(&req.id).await;
    let _guard = lock.lock().await;
    state
        .engine
        .create_account(&req.id, &req.name, req.tier, req.size, today())?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: req.id })))
}

/// GET /api/accounts/:id/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountStatus>, ApiError> {
    // Reads take the lock too: a mutation saves the ledger and config
    // documents separately, and a report spanning both must not observe
    // one without the other.
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    Ok(Json(state.engine.status(&account_id, today())?))
}

/// GET /api/accounts/:id/ledger
pub async fn get_ledger(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Ledger>, ApiError> {
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    Ok(Json(state.engine.load_ledger(&account_id)?))
}

/// POST /api/accounts/:id/bets
pub async fn add_bet(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<AddBetRequest>,
) -> Result<Json<BetAdded>, ApiError> {
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    let added = state.engine.add_bet(
        &account_id,
        NewBet {
            date: req.date,
            sport: req.sport,
            selection: req.selection,
            stake: req.stake,
            odds: req.odds,
            result: req.result,
            is_parlay: req.is_parlay,
            parlay_legs: req.parlay_legs,
        },
        today(),
    )?;
    Ok(Json(added))
}

/// PUT /api/accounts/:id/bets/:bet_id
pub async fn edit_bet(
    State(state): State<AppState>,
    Path((account_id, bet_id)): Path<(String, String)>,
    Json(req): Json<EditBetRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    let new_balance = state.engine.edit_bet(
        &account_id,
        &bet_id,
        BetPatch {
            date: req.date,
            sport: req.sport,
            selection: req.selection,
            stake: req.stake,
            odds: req.odds,
            result: req.result,
        },
    )?;
    Ok(Json(BalanceResponse { new_balance }))
}

/// DELETE /api/accounts/:id/bets/:bet_id
pub async fn delete_bet(
    State(state): State<AppState>,
    Path((account_id, bet_id)): Path<(String, String)>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    let new_balance = state.engine.delete_bet(&account_id, &bet_id)?;
    Ok(Json(BalanceResponse { new_balance }))
}

/// POST /api/accounts/:id/clear
///
/// Destructive: the UI owes the user a double confirmation before
/// calling this.
pub async fn clear_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    let new_balance = state.engine.clear_all(&account_id)?;
    Ok(Json(BalanceResponse { new_balance }))
}

/// POST /api/accounts/:id/import
pub async fn import_csv(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportReport>, ApiError> {
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    // The config document is the existence check; a zeroed ledger alone
    // would silently import into nothing.
    state.engine.status(&account_id, today())?;
    let report = ingest::import(&state.engine, &account_id, &req.csv, today())?;
    Ok(Json(report))
}

/// POST /api/accounts/:id/advance-phase
pub async fn advance_phase(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let lock = state.account_lock(&account_id).await;
    let _guard = lock.lock().await;
    let message = state.engine.advance_phase(&account_id)?;
    Ok(Json(MessageResponse { message }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
