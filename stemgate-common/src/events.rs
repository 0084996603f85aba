//! Event types for the Stemgate event system
//!
//! Events are broadcast in-process over a tokio broadcast channel and
//! streamed to UI clients via SSE. UI players rely on `PlaybackStopped` to
//! flip their play/pause icons without polling.

use crate::types::CandidateTier;
use serde::{Deserialize, Serialize};

/// Stemgate event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StemEvent {
    /// A stem URL was resolved and written back to the cache
    StemResolved {
        track_id: String,
        stem_name: String,
        url: String,
        tier: CandidateTier,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every tier was exhausted without a playable URL
    ResolutionFailed {
        track_id: String,
        stem_name: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A stem began playing in the shared audible slot
    PlaybackStarted {
        stem_id: String,
        track_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The previously audible stem was stopped
    ///
    /// Carries the identity of the stem that was playing, not the one that
    /// displaced it.
    PlaybackStopped {
        stem_id: String,
        track_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Cache entries were cleared
    CacheCleared {
        /// "all", "track:<id>" or "stem:<key>"
        scope: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl StemEvent {
    /// Event type string used as the SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            StemEvent::StemResolved { .. } => "StemResolved",
            StemEvent::ResolutionFailed { .. } => "ResolutionFailed",
            StemEvent::PlaybackStarted { .. } => "PlaybackStarted",
            StemEvent::PlaybackStopped { .. } => "PlaybackStopped",
            StemEvent::CacheCleared { .. } => "CacheCleared",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_shape() {
        let event = StemEvent::PlaybackStopped {
            stem_id: "s1".to_string(),
            track_id: "t1".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"PlaybackStopped""#));
        assert!(json.contains(r#""stem_id":"s1""#));
        assert!(json.contains(r#""track_id":"t1""#));
    }

    #[test]
    fn test_resolved_event_carries_tier() {
        let event = StemEvent::StemResolved {
            track_id: "t1".to_string(),
            stem_name: "Bass".to_string(),
            url: "/api/media/Bass_Elevator_music_6cb3bdeb25.mp3".to_string(),
            tier: CandidateTier::HashTable,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""tier":"hash-table""#));
        assert_eq!(event.event_type(), "StemResolved");
    }
}
