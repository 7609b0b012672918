use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let ops = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics));

    let api = Router::new()
        .route("/api/", get(handlers::health::api_root))
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route("/api/leaderboard/:stat_type", get(handlers::leaderboard::leaderboard))
        .route("/api/wallet/:address", get(handlers::wallet::overview))
        .route("/api/wallet/:address/balances", get(handlers::wallet::balances));

    // Browser frontends are served from other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    ops.merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
