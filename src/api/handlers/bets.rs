use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::betting;
use crate::db::bet_repo;
use crate::errors::AppError;
use crate::models::BetView;
use crate::AppState;

#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub cartela_id: Uuid,
}

/// POST /api/bets/confirm: confirm a pending cartela into a bet
pub async fn confirm(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ConfirmRequest>,
) -> Result<(StatusCode, Json<BetView>), AppError> {
    let bet = betting::confirm(&state.db, user.id, body.cartela_id).await?;
    let view = bet_repo::get_bet_view(&state.db, bet.id)
        .await?
        .ok_or_else(|| AppError::NotFound("bet not found".into()))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/bets/my: the caller's bets, newest first
pub async fn my_bets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BetView>>, AppError> {
    let bets = bet_repo::list_bets_for_user(&state.db, user.id).await?;
    Ok(Json(bets))
}
