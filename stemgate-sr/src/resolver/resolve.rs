//! Resolution orchestration
//!
//! Drives the tiers in order (cache, hash table, declared URL, alternative
//! URLs, file search), short-circuiting on the first candidate that both
//! exists and validates against the stem identity. The winner is written
//! back to the cache. Tiers run strictly in sequence; only one correct URL
//! exists, so early success skips the remaining network calls.

use crate::resolver::cache::UrlCache;
use crate::resolver::candidates::CandidateGenerator;
use crate::resolver::files::AudioFileIndex;
use crate::resolver::matching::StemValidator;
use crate::resolver::probe::UrlProbe;
use crate::state::SharedState;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use stemgate_common::events::StemEvent;
use stemgate_common::{CandidateTier, Error, Result, Stem, StemIdentity, Track};
use tracing::{debug, info, warn};

/// Resolution pipeline states, surfaced in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    CheckingCache,
    CheckingHashTable,
    CheckingDeclaredUrl,
    CheckingAlternatives,
    SearchingFiles,
    Resolved,
    Failed,
}

impl fmt::Display for ResolveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One tier's diagnostic record
#[derive(Debug, Clone, Serialize)]
pub struct TierAttempt {
    pub tier: CandidateTier,
    pub candidates: usize,
    pub hit: bool,
}

/// A successful resolution
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub url: String,
    pub tier: CandidateTier,
    /// Tiers consulted, in order, including the winning one
    pub attempts: Vec<TierAttempt>,
}

pub struct Resolver {
    cache: Arc<UrlCache>,
    validator: StemValidator,
    generator: CandidateGenerator,
    probe: Arc<dyn UrlProbe>,
    index: Arc<AudioFileIndex>,
    state: Arc<SharedState>,
    /// URLs confirmed to exist earlier in this process; a warm cache hit
    /// costs no network call.
    confirmed: Mutex<HashSet<String>>,
}

impl Resolver {
    pub fn new(
        cache: Arc<UrlCache>,
        validator: StemValidator,
        generator: CandidateGenerator,
        probe: Arc<dyn UrlProbe>,
        index: Arc<AudioFileIndex>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            cache,
            validator,
            generator,
            probe,
            index,
            state,
            confirmed: Mutex::new(HashSet::new()),
        }
    }

    /// Resolve a playable URL for `stem` of `track`.
    ///
    /// Fails immediately with `InvalidInput` on blank identity components
    /// (no network calls), and with `NotFound` when every tier exhausts.
    pub async fn resolve(&self, track: &Track, stem: &Stem) -> Result<Resolution> {
        let identity = StemIdentity::new(track, stem)?;
        self.run_pipeline(&identity, stem).await
    }

    /// Purge the cache entry and re-run the whole pipeline.
    ///
    /// `force_refresh` additionally refetches the media library listing and
    /// forgets every confirmed probe, so staleness recovery always touches
    /// the network again.
    pub async fn reload(&self, track: &Track, stem: &Stem, force_refresh: bool) -> Result<Resolution> {
        let identity = StemIdentity::new(track, stem)?;

        if let Some(url) = self.cache.get(&identity) {
            self.confirmed.lock().unwrap().remove(&url);
        }
        self.cache.remove(&identity);

        if force_refresh {
            self.confirmed.lock().unwrap().clear();
            self.index.refresh().await;
        }

        info!(identity = %identity, force_refresh, "Reloading stem URL");
        self.run_pipeline(&identity, stem).await
    }

    async fn run_pipeline(&self, identity: &StemIdentity, stem: &Stem) -> Result<Resolution> {
        let mut attempts = Vec::new();

        debug!(identity = %identity, state = %ResolveState::CheckingCache, "Resolving stem URL");
        if let Some(resolution) = self.check_cache(identity, &mut attempts).await {
            return Ok(self.finish(identity, resolution));
        }

        let tiers: [(ResolveState, CandidateTier, Vec<String>); 3] = [
            (
                ResolveState::CheckingHashTable,
                CandidateTier::HashTable,
                self.generator.hash_table(identity),
            ),
            (
                ResolveState::CheckingDeclaredUrl,
                CandidateTier::DeclaredUrl,
                self.generator.declared(stem),
            ),
            (
                ResolveState::CheckingAlternatives,
                CandidateTier::AlternativeUrls,
                self.generator.alternatives(stem),
            ),
        ];

        for (state, tier, candidates) in tiers {
            debug!(identity = %identity, state = %state, candidates = candidates.len(), "Trying tier");
            if let Some(url) = self.try_candidates(identity, &candidates).await {
                attempts.push(TierAttempt {
                    tier,
                    candidates: candidates.len(),
                    hit: true,
                });
                return Ok(self.finish(identity, Resolution { url, tier, attempts }));
            }
            attempts.push(TierAttempt {
                tier,
                candidates: candidates.len(),
                hit: false,
            });
        }

        debug!(identity = %identity, state = %ResolveState::SearchingFiles, "Trying tier");
        let files = self.index.files().await;
        let candidates = self.generator.file_search(identity, &files);
        if let Some(url) = self.try_candidates(identity, &candidates).await {
            attempts.push(TierAttempt {
                tier: CandidateTier::FileSearch,
                candidates: candidates.len(),
                hit: true,
            });
            return Ok(self.finish(
                identity,
                Resolution {
                    url,
                    tier: CandidateTier::FileSearch,
                    attempts,
                },
            ));
        }
        attempts.push(TierAttempt {
            tier: CandidateTier::FileSearch,
            candidates: candidates.len(),
            hit: false,
        });

        let message = format!("no playable URL found for {identity}");
        warn!(identity = %identity, state = %ResolveState::Failed, "{message}");
        self.state.record_failure();
        self.state.broadcast_event(StemEvent::ResolutionFailed {
            track_id: identity.track_id.clone(),
            stem_name: identity.stem_name.clone(),
            message: message.clone(),
            timestamp: chrono::Utc::now(),
        });
        Err(Error::NotFound(message))
    }

    /// Cache tier: re-validate identity and re-check existence; stale
    /// entries are purged silently and resolution falls through.
    async fn check_cache(
        &self,
        identity: &StemIdentity,
        attempts: &mut Vec<TierAttempt>,
    ) -> Option<Resolution> {
        let Some(cached_url) = self.cache.get(identity) else {
            attempts.push(TierAttempt {
                tier: CandidateTier::Cached,
                candidates: 0,
                hit: false,
            });
            return None;
        };

        if self.validator.validate(identity, &cached_url) && self.ensure_exists(&cached_url).await {
            attempts.push(TierAttempt {
                tier: CandidateTier::Cached,
                candidates: 1,
                hit: true,
            });
            return Some(Resolution {
                url: cached_url,
                tier: CandidateTier::Cached,
                attempts: std::mem::take(attempts),
            });
        }

        debug!(identity = %identity, url = %cached_url, "Purging stale cache entry");
        self.cache.remove(identity);
        self.confirmed.lock().unwrap().remove(&cached_url);
        attempts.push(TierAttempt {
            tier: CandidateTier::Cached,
            candidates: 1,
            hit: false,
        });
        None
    }

    /// Try one tier's candidates in order; first identity-valid candidate
    /// that exists wins.
    async fn try_candidates(&self, identity: &StemIdentity, candidates: &[String]) -> Option<String> {
        for candidate in candidates {
            if !self.validator.validate(identity, candidate) {
                debug!(identity = %identity, url = %candidate, "Candidate fails identity validation, skipping");
                continue;
            }
            if self.ensure_exists(candidate).await {
                return Some(candidate.clone());
            }
        }
        None
    }

    /// Existence check with a process-lifetime positive memo: a URL
    /// confirmed once is not re-probed until `reload` evicts it.
    async fn ensure_exists(&self, url: &str) -> bool {
        if self.confirmed.lock().unwrap().contains(url) {
            return true;
        }
        let outcome = self.probe.probe(url).await;
        if outcome.exists() {
            self.confirmed.lock().unwrap().insert(url.to_string());
            true
        } else {
            false
        }
    }

    fn finish(&self, identity: &StemIdentity, resolution: Resolution) -> Resolution {
        if resolution.tier != CandidateTier::Cached {
            self.cache.insert(identity, &resolution.url);
        }
        info!(
            identity = %identity,
            url = %resolution.url,
            tier = %resolution.tier,
            state = %ResolveState::Resolved,
            "Stem URL resolved"
        );
        self.state.record_resolution();
        self.state.broadcast_event(StemEvent::StemResolved {
            track_id: identity.track_id.clone(),
            stem_name: identity.stem_name.clone(),
            url: resolution.url.clone(),
            tier: resolution.tier,
            timestamp: chrono::Utc::now(),
        });
        resolution
    }
}
