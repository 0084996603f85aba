//! Shared service state
//!
//! Owns the broadcast channel that fans events out to SSE clients and a few
//! counters surfaced by the status endpoint. Constructed once in `main` and
//! shared via `Arc`; components receive it explicitly instead of reaching
//! for a global.

use std::sync::atomic::{AtomicU64, Ordering};
use stemgate_common::events::StemEvent;
use tokio::sync::broadcast;

/// Shared state accessible by all components
pub struct SharedState {
    /// Event broadcaster for SSE events
    pub event_tx: broadcast::Sender<StemEvent>,

    /// Total successful resolutions since startup
    pub resolutions_total: AtomicU64,

    /// Total exhausted resolutions since startup
    pub resolution_failures_total: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            event_tx,
            resolutions_total: AtomicU64::new(0),
            resolution_failures_total: AtomicU64::new(0),
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: StemEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<StemEvent> {
        self.event_tx.subscribe()
    }

    pub fn record_resolution(&self) {
        self.resolutions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.resolution_failures_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        state.broadcast_event(StemEvent::CacheCleared {
            scope: "all".to_string(),
            timestamp: chrono::Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "CacheCleared");
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let state = SharedState::new();
        state.broadcast_event(StemEvent::CacheCleared {
            scope: "all".to_string(),
            timestamp: chrono::Utc::now(),
        });
    }
}
