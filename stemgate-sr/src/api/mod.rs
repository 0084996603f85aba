//! REST API for the stem resolver service

pub mod handlers;
pub mod sse;

use crate::config::ServiceConfig;
use crate::playback::PlaybackCoordinator;
use crate::resolver::cache::UrlCache;
use crate::resolver::resolve::Resolver;
use crate::state::SharedState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub cache: Arc<UrlCache>,
    pub coordinator: Arc<PlaybackCoordinator>,
    pub state: Arc<SharedState>,
    pub config: Arc<ServiceConfig>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .nest(
            "/api/v1",
            Router::new()
                // Resolution endpoints
                .route("/resolve", post(handlers::resolve))
                .route("/resolve/reload", post(handlers::reload))
                // Cache management endpoints
                .route("/cache", delete(handlers::clear_cache))
                .route("/cache/track/:track_id", delete(handlers::clear_track))
                .route("/cache/stem", delete(handlers::clear_stem))
                // Playback slot arbitration
                .route("/playback/start", post(handlers::playback_start))
                .route("/playback/stop", post(handlers::playback_stop))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
