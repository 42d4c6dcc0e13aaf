use axum::extract::{Query, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthUser;
use crate::errors::AppError;
use crate::ledger::{self, DEFAULT_ENTRY_LIMIT};
use crate::models::{LedgerEntry, Wallet};
use crate::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct EntriesQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreditRequest {
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreditResponse {
    pub wallet: Wallet,
    pub entry: LedgerEntry,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/wallet: the caller's balances
pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Wallet>, AppError> {
    let wallet = ledger::wallet_for(&state.db, user.id).await?;
    Ok(Json(wallet))
}

/// GET /api/wallet/entries?limit=: most recent ledger entries
pub async fn entries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<EntriesQuery>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_ENTRY_LIMIT);
    let entries = ledger::list_entries(&state.db, user.id, limit).await?;
    Ok(Json(entries))
}

/// POST /api/wallet/deposit: credit funds
pub async fn deposit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreditRequest>,
) -> Result<Json<CreditResponse>, AppError> {
    let (wallet, entry) =
        ledger::deposit(&state.db, user.id, body.amount, body.description.as_deref()).await?;
    Ok(Json(CreditResponse { wallet, entry }))
}

/// POST /api/wallet/bonus: credit bonus points
pub async fn bonus(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreditRequest>,
) -> Result<Json<CreditResponse>, AppError> {
    let (wallet, entry) =
        ledger::grant_bonus(&state.db, user.id, body.amount, body.description.as_deref()).await?;
    Ok(Json(CreditResponse { wallet, entry }))
}
