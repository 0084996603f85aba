//! HTTP request handlers
//!
//! Resolution failures come back as structured JSON errors, never panics:
//! invalid identities map to 400, exhausted resolutions to 404, everything
//! else to 500.

use crate::api::AppState;
use crate::playback::{DetachedHandle, PlaybackIdentity};
use crate::resolver::resolve::Resolution;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use stemgate_common::{Error, Stem, StemIdentity, Track};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    track: Track,
    stem: Stem,
}

#[derive(Debug, Deserialize)]
pub struct ReloadRequest {
    track: Track,
    stem: Stem,
    #[serde(default, rename = "forceRefresh")]
    force_refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClearStemRequest {
    track_id: String,
    track_title: String,
    stem_name: String,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    removed: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackStartRequest {
    stem_id: String,
    track_id: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatusResponse {
    service: String,
    version: String,
    cache_entries: usize,
    cache_path: String,
    resolutions_total: u64,
    resolution_failures_total: u64,
    now_playing: Option<NowPlaying>,
}

#[derive(Debug, Serialize)]
pub struct NowPlaying {
    stem_id: String,
    track_id: String,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn error_response(error: Error) -> ApiError {
    let status = match &error {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(StatusResponse {
            status: format!("error: {error}"),
        }),
    )
}

// ============================================================================
// Health / Status
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "stem_resolver".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /status - Service status
pub async fn status(State(app): State<AppState>) -> Json<ServiceStatusResponse> {
    let now_playing = app.coordinator.current().await.map(|p| NowPlaying {
        stem_id: p.stem_id,
        track_id: p.track_id,
    });
    Json(ServiceStatusResponse {
        service: "stemgate-sr".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: app.cache.len(),
        cache_path: app.config.cache_path.display().to_string(),
        resolutions_total: app.state.resolutions_total.load(Ordering::Relaxed),
        resolution_failures_total: app.state.resolution_failures_total.load(Ordering::Relaxed),
        now_playing,
    })
}

// ============================================================================
// Resolution
// ============================================================================

/// POST /api/v1/resolve - Resolve a playable URL for a stem
pub async fn resolve(
    State(app): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<Resolution>, ApiError> {
    app.resolver
        .resolve(&req.track, &req.stem)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/v1/resolve/reload - Purge the cache entry and re-resolve
pub async fn reload(
    State(app): State<AppState>,
    Json(req): Json<ReloadRequest>,
) -> Result<Json<Resolution>, ApiError> {
    app.resolver
        .reload(&req.track, &req.stem, req.force_refresh)
        .await
        .map(Json)
        .map_err(error_response)
}

// ============================================================================
// Cache management
// ============================================================================

/// DELETE /api/v1/cache - Clear the whole stem URL cache
pub async fn clear_cache(State(app): State<AppState>) -> Json<ClearResponse> {
    let removed = app.cache.clear_all();
    info!(removed, "Cleared stem URL cache");
    app.state
        .broadcast_event(stemgate_common::events::StemEvent::CacheCleared {
            scope: "all".to_string(),
            timestamp: chrono::Utc::now(),
        });
    Json(ClearResponse { removed })
}

/// DELETE /api/v1/cache/track/:track_id - Clear one track's entries
pub async fn clear_track(
    State(app): State<AppState>,
    Path(track_id): Path<String>,
) -> Json<ClearResponse> {
    let removed = app.cache.clear_track(&track_id);
    info!(track_id = %track_id, removed, "Cleared track cache entries");
    app.state
        .broadcast_event(stemgate_common::events::StemEvent::CacheCleared {
            scope: format!("track:{track_id}"),
            timestamp: chrono::Utc::now(),
        });
    Json(ClearResponse { removed })
}

/// DELETE /api/v1/cache/stem - Clear one stem's entry
pub async fn clear_stem(
    State(app): State<AppState>,
    Json(req): Json<ClearStemRequest>,
) -> Result<Json<ClearResponse>, ApiError> {
    let identity = StemIdentity::from_parts(&req.track_id, &req.track_title, &req.stem_name)
        .map_err(error_response)?;
    let removed = usize::from(app.cache.remove(&identity));
    app.state
        .broadcast_event(stemgate_common::events::StemEvent::CacheCleared {
            scope: format!("stem:{}", identity.cache_key()),
            timestamp: chrono::Utc::now(),
        });
    Ok(Json(ClearResponse { removed }))
}

// ============================================================================
// Playback slot
// ============================================================================

/// POST /api/v1/playback/start - Claim the audible slot for a stem
///
/// The audio element lives in the client; the service arbitrates the slot
/// and announces the displaced stem over SSE.
pub async fn playback_start(
    State(app): State<AppState>,
    Json(req): Json<PlaybackStartRequest>,
) -> StatusCode {
    app.coordinator
        .play(
            Arc::new(DetachedHandle),
            PlaybackIdentity {
                stem_id: req.stem_id,
                track_id: req.track_id,
            },
        )
        .await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/playback/stop - Release the audible slot
pub async fn playback_stop(State(app): State<AppState>) -> StatusCode {
    app.coordinator.stop().await;
    StatusCode::NO_CONTENT
}
