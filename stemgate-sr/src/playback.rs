//! Playback coordination
//!
//! Exactly one stem may be audible at a time. Every player routes through
//! the shared coordinator instead of starting its handle directly; the
//! coordinator stops the previous occupant of the audible slot (pause +
//! rewind to zero) and broadcasts a `PlaybackStopped` event carrying the
//! displaced identity, so UI players can flip their play/pause icons
//! without polling.
//!
//! The exactly-one-coordinator invariant is held by ownership: the
//! instance is constructed at the application root and shared via `Arc`.

use crate::state::SharedState;
use async_trait::async_trait;
use std::sync::Arc;
use stemgate_common::events::StemEvent;
use stemgate_common::Result;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A cooperating playback handle (an audio element, a decoder sink, ...)
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    /// Begin playback from the current position.
    async fn play(&self) -> Result<()>;
    /// Pause without losing the handle.
    fn pause(&self);
    /// Rewind to position zero.
    fn reset(&self);
}

/// Identity of the stem occupying the audible slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackIdentity {
    pub stem_id: String,
    pub track_id: String,
}

struct ActivePlayback {
    handle: Arc<dyn PlaybackHandle>,
    identity: PlaybackIdentity,
}

/// Handle for a player whose audio element lives outside this process
/// (a browser client). The server arbitrates the audible slot and emits
/// the stop/start events; transport control stays with the client.
pub struct DetachedHandle;

#[async_trait]
impl PlaybackHandle for DetachedHandle {
    async fn play(&self) -> Result<()> {
        Ok(())
    }

    fn pause(&self) {}

    fn reset(&self) {}
}

/// Arbitrates the single "currently audible" slot
pub struct PlaybackCoordinator {
    active: Mutex<Option<ActivePlayback>>,
    state: Arc<SharedState>,
}

impl PlaybackCoordinator {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self {
            active: Mutex::new(None),
            state,
        }
    }

    /// Start `handle` playing as `identity`.
    ///
    /// A different active handle is paused, rewound, and announced via
    /// exactly one `PlaybackStopped` event before the new handle starts.
    /// Playback-start failures are logged and clear the slot; they are
    /// never propagated.
    pub async fn play(&self, handle: Arc<dyn PlaybackHandle>, identity: PlaybackIdentity) {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            if Arc::ptr_eq(&previous.handle, &handle) && previous.identity == identity {
                // Same element resuming; nothing was displaced.
                debug!(stem_id = %identity.stem_id, "Resuming active playback handle");
            } else {
                self.stop_previous(previous);
            }
        }

        *active = Some(ActivePlayback {
            handle: handle.clone(),
            identity: identity.clone(),
        });

        match handle.play().await {
            Ok(()) => {
                debug!(stem_id = %identity.stem_id, track_id = %identity.track_id, "Playback started");
                self.state.broadcast_event(StemEvent::PlaybackStarted {
                    stem_id: identity.stem_id,
                    track_id: identity.track_id,
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(e) => {
                warn!(stem_id = %identity.stem_id, error = %e, "Playback start failed");
                *active = None;
            }
        }
    }

    /// Stop whatever is playing, if anything. Idempotent.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            self.stop_previous(previous);
        }
    }

    /// Identity currently occupying the slot, if any.
    pub async fn current(&self) -> Option<PlaybackIdentity> {
        self.active.lock().await.as_ref().map(|a| a.identity.clone())
    }

    fn stop_previous(&self, previous: ActivePlayback) {
        previous.handle.pause();
        previous.handle.reset();
        debug!(
            stem_id = %previous.identity.stem_id,
            track_id = %previous.identity.track_id,
            "Stopped previous playback"
        );
        self.state.broadcast_event(StemEvent::PlaybackStopped {
            stem_id: previous.identity.stem_id,
            track_id: previous.identity.track_id,
            timestamp: chrono::Utc::now(),
        });
    }
}
