//! HTTP server setup and routing

use std::sync::Arc;

use axum::{
    response::Html,
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::horoscope::HoroscopeClient;
use crate::tracker::Tracker;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone; every field is either a handle or a
/// pool, so clones are cheap.
#[derive(Clone)]
pub struct AppContext {
    pub tracker: Tracker,
    pub horoscope: Arc<HoroscopeClient>,
    pub db_pool: SqlitePool,
}

/// Build the application router with all routes
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Embedded single-page UI
        .route("/", get(|| async { Html(include_str!("index.html")) }))
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Participants and the rating scale
        .route("/api/participants", get(super::handlers::get_participants))
        .route(
            "/api/participants/:id",
            put(super::handlers::update_participant),
        )
        // Rating history and today's state
        .route("/api/ratings", get(super::handlers::get_ratings))
        .route("/api/ratings", post(super::handlers::save_rating))
        .route("/api/ratings/today", get(super::handlers::get_today))
        .route("/api/ratings/cancel", post(super::handlers::cancel_rating))
        // Sync lookups and horoscopes
        .route("/api/sync/latest", get(super::handlers::get_latest_sync))
        .route("/api/horoscope", get(super::handlers::get_horoscope))
        // SSE event stream
        .route("/api/events", get(super::sse::event_stream))
        // Attach application context
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
