use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::identity;
use crate::AppState;

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Bearer-token authentication middleware.
///
/// Every request must carry `Authorization: Bearer <token>` matching an
/// active user's token. Anything else is answered with 401.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default()
        .to_owned();

    match identity::authenticate(&state.db, &token).await {
        Ok(user) => {
            req.extensions_mut().insert(AuthUser {
                id: user.id,
                username: user.username,
            });
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
