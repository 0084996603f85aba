//! Durable stem URL cache
//!
//! A single JSON document mapping `trackId:trackTitle:stemName` to the
//! resolved URL. Reads and writes are whole-object: load the map, mutate,
//! write the map back. Persistence failures are logged and never block
//! resolution; a corrupt file resets to an empty map.

use crate::resolver::matching::StemValidator;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use stemgate_common::StemIdentity;
use tracing::{debug, warn};

pub struct UrlCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl UrlCache {
    /// Open the cache at `path`, loading any existing entries.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt stem URL cache, resetting");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened stem URL cache");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Scan the whole store and drop every entry whose URL no longer
    /// validates against the identity encoded in its key. Malformed keys
    /// are dropped too. Returns the number of purged entries.
    pub fn init_scan(&self, validator: &StemValidator) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, url| match StemIdentity::from_cache_key(key) {
            Some(identity) => {
                let valid = validator.validate(&identity, url);
                if !valid {
                    debug!(key = %key, url = %url, "Purging mismatched cache entry");
                }
                valid
            }
            None => {
                debug!(key = %key, "Purging cache entry with malformed key");
                false
            }
        });
        let purged = before - entries.len();
        if purged > 0 {
            Self::persist(&self.path, &entries);
        }
        purged
    }

    pub fn get(&self, identity: &StemIdentity) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&identity.cache_key())
            .cloned()
    }

    pub fn insert(&self, identity: &StemIdentity, url: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(identity.cache_key(), url.to_string());
        Self::persist(&self.path, &entries);
    }

    /// Remove one entry; returns whether it was present.
    pub fn remove(&self, identity: &StemIdentity) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let removed = entries.remove(&identity.cache_key()).is_some();
        if removed {
            Self::persist(&self.path, &entries);
        }
        removed
    }

    /// Remove every entry belonging to a track.
    pub fn clear_track(&self, track_id: &str) -> usize {
        let prefix = format!("{track_id}:");
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - entries.len();
        if removed > 0 {
            Self::persist(&self.path, &entries);
        }
        removed
    }

    pub fn clear_all(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let removed = entries.len();
        entries.clear();
        Self::persist(&self.path, &entries);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whole-object write: temp file then rename, best effort.
    fn persist(path: &Path, entries: &HashMap<String, String>) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Cannot create cache directory");
                return;
            }
        }
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Cannot serialize stem URL cache");
                return;
            }
        };
        let tmp = path.with_extension("json.tmp");
        let result = std::fs::write(&tmp, json).and_then(|_| std::fs::rename(&tmp, path));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Cannot persist stem URL cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Heuristics;
    use std::sync::Arc;

    fn validator() -> StemValidator {
        StemValidator::new(Arc::new(Heuristics::default()))
    }

    fn identity(track_id: &str, title: &str, stem: &str) -> StemIdentity {
        StemIdentity::from_parts(track_id, title, stem).unwrap()
    }

    #[test]
    fn test_insert_get_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let id = identity("t1", "Elevator Music", "Bass");

        {
            let cache = UrlCache::open(&path);
            cache.insert(&id, "/api/media/Bass_Elevator_music_6cb3bdeb25.mp3");
            assert_eq!(
                cache.get(&id).as_deref(),
                Some("/api/media/Bass_Elevator_music_6cb3bdeb25.mp3")
            );
        }

        let reopened = UrlCache::open(&path);
        assert_eq!(
            reopened.get(&id).as_deref(),
            Some("/api/media/Bass_Elevator_music_6cb3bdeb25.mp3")
        );
    }

    #[test]
    fn test_corrupt_file_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json ").unwrap();

        let cache = UrlCache::open(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_init_scan_purges_exactly_the_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = UrlCache::open(&path);

        let good = identity("t1", "Elevator Music", "Bass");
        let stale = identity("t2", "Elevator Music", "Drums");
        let lofi = identity("t3", "Lo-Fi Beats", "Drums");

        cache.insert(&good, "/api/media/Bass_Elevator_music_6cb3bdeb25.mp3");
        // URL belongs to a different track
        cache.insert(&stale, "/api/media/Drums_Crazy_meme_music_abc123.mp3");
        cache.insert(&lofi, "/api/media/Drums_lofibeats_demo.mp3");

        let purged = cache.init_scan(&validator());
        assert_eq!(purged, 1);
        assert!(cache.get(&good).is_some());
        assert!(cache.get(&stale).is_none());
        assert!(cache.get(&lofi).is_some());
    }

    #[test]
    fn test_clear_track_removes_only_that_track() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UrlCache::open(dir.path().join("cache.json"));

        cache.insert(&identity("t1", "Elevator Music", "Bass"), "/u/a.mp3");
        cache.insert(&identity("t1", "Elevator Music", "Drums"), "/u/b.mp3");
        cache.insert(&identity("t2", "Lo-Fi Beats", "Drums"), "/u/c.mp3");

        assert_eq!(cache.clear_track("t1"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&identity("t2", "Lo-Fi Beats", "Drums")).is_some());
    }

    #[test]
    fn test_clear_all() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UrlCache::open(dir.path().join("cache.json"));
        cache.insert(&identity("t1", "Elevator Music", "Bass"), "/u/a.mp3");
        assert_eq!(cache.clear_all(), 1);
        assert!(cache.is_empty());
    }
}
