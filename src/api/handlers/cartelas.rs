use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::betting::{self, QuoteRequest, RiskFlags};
use crate::db::{cartela_repo, event_repo, template_repo};
use crate::errors::AppError;
use crate::models::{CartelaDetail, CartelaInstance, CartelaTemplate, Event, MarketSelection};
use crate::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SelectionsQuery {
    pub template_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub cartela_id: Uuid,
    pub odd_final: Decimal,
    pub premio_maximo: Decimal,
    pub valid_until: DateTime<Utc>,
    pub risk_flags: RiskFlags,
}

async fn find_event(state: &AppState, event_id: Uuid) -> Result<Event, AppError> {
    event_repo::get_event(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id} not found")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/cartelas/event/{event_id}/templates: active templates
pub async fn templates(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<CartelaTemplate>>, AppError> {
    find_event(&state, event_id).await?;
    let templates = template_repo::list_active_templates(&state.db).await?;
    Ok(Json(templates))
}

/// GET /api/cartelas/event/{event_id}/selections?template_id=: selections
/// eligible for the template (live-only for live and turbo templates).
/// Inactive templates still resolve here; only quoting requires an active one.
pub async fn selections(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(params): Query<SelectionsQuery>,
) -> Result<Json<Vec<MarketSelection>>, AppError> {
    let event = find_event(&state, event_id).await?;

    let Some(template_id) = params.template_id else {
        let all = event_repo::get_selections_for_event(&state.db, event.id, false).await?;
        return Ok(Json(all));
    };

    let template = template_repo::get_template(&state.db, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cartela template {template_id} not found")))?;
    let live_only = template.kind().is_some_and(|k| k.live_only());

    let mut selections =
        event_repo::get_selections_for_event(&state.db, event.id, live_only).await?;

    let allowed = template_repo::get_template_items(&state.db, template.id).await?;
    if !allowed.is_empty() {
        selections.retain(|s| {
            allowed
                .iter()
                .any(|i| i.allowed_selection_type == s.selection_type)
        });
    }

    Ok(Json(selections))
}

/// POST /api/cartelas/quote: price a cartela and hold it for confirmation
pub async fn quote(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<QuoteRequest>,
) -> Result<(StatusCode, Json<QuoteResponse>), AppError> {
    let outcome = betting::quote(
        &state.db,
        state.risk_policy.as_ref(),
        state.config.quote_validity(),
        user.id,
        &body,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(QuoteResponse {
            cartela_id: outcome.instance.id,
            odd_final: outcome.odd_final,
            premio_maximo: outcome.potential_return,
            valid_until: outcome.valid_until,
            risk_flags: outcome.risk_flags,
        }),
    ))
}

/// GET /api/cartelas/{id}: the caller's cartela with its items
pub async fn detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CartelaDetail>, AppError> {
    let instance = cartela_repo::get_instance_for_user(&state.db, id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cartela {id} not found")))?;

    let event = find_event(&state, instance.event_id).await?;
    let template = template_repo::get_template(&state.db, instance.cartela_template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cartela template not found".into()))?;
    let items = cartela_repo::get_item_views(&state.db, instance.id).await?;

    Ok(Json(CartelaDetail {
        id: instance.id,
        user_id: instance.user_id,
        event: event.summary(),
        cartela_template_name: template.name,
        status: instance.status,
        odd_final: instance.odd_final,
        premio_maximo: instance.premio_maximo,
        stake: instance.stake,
        snapshot_data: instance.snapshot_data,
        created_at: instance.created_at,
        valid_until: instance.valid_until,
        locked_at: instance.locked_at,
        items,
    }))
}

/// POST /api/cartelas/{id}/cancel: withdraw an unconfirmed cartela
pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CartelaInstance>, AppError> {
    let instance = betting::cancel(&state.db, user.id, id).await?;
    Ok(Json(instance))
}
