//! Tidewell API — HTTP and WebSocket surface over the game engine.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod notifier;
pub mod routes;
pub mod state;

/// Builds the full application router.
pub fn build_router(app_state: state::AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the moderator console's origin once it is hosted.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/admin", routes::admin::router(app_state.clone()))
        .nest("/api/v1/players", routes::players::router())
        .merge(routes::global::router())
        .merge(routes::stream::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
