use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes: require a user's Bearer token
    let protected = Router::new()
        // Catalog
        .route("/api/events", get(handlers::events::list))
        .route("/api/cartelas/event/:event_id/templates", get(handlers::cartelas::templates))
        .route("/api/cartelas/event/:event_id/selections", get(handlers::cartelas::selections))
        // Quoting
        .route("/api/cartelas/quote", post(handlers::cartelas::quote))
        .route("/api/cartelas/:id", get(handlers::cartelas::detail))
        .route("/api/cartelas/:id/cancel", post(handlers::cartelas::cancel))
        // Bets
        .route("/api/bets/confirm", post(handlers::bets::confirm))
        .route("/api/bets/my", get(handlers::bets::my_bets))
        // Wallet
        .route("/api/wallet", get(handlers::wallet::summary))
        .route("/api/wallet/entries", get(handlers::wallet::entries))
        .route("/api/wallet/deposit", post(handlers::wallet::deposit))
        .route("/api/wallet/bonus", post(handlers::wallet::bonus))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
