use axum::extract::State;
use axum::Json;

use crate::db::event_repo;
use crate::errors::AppError;
use crate::models::Event;
use crate::AppState;

/// GET /api/events: scheduled and live events, soonest first
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    let events = event_repo::list_open_events(&state.db).await?;
    Ok(Json(events))
}
