//! Shared test fixtures: stub collaborators and service wiring

// Not every test binary uses every fixture
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stemgate_common::{AudioFile, Result, Stem, Track};
use stemgate_sr::config::ServiceConfig;
use stemgate_sr::resolver::cache::UrlCache;
use stemgate_sr::resolver::candidates::CandidateGenerator;
use stemgate_sr::resolver::files::{AudioFileIndex, FileListing};
use stemgate_sr::resolver::matching::StemValidator;
use stemgate_sr::resolver::probe::{ProbeOutcome, UrlProbe};
use stemgate_sr::resolver::resolve::Resolver;
use stemgate_sr::state::SharedState;

/// Probe stub backed by a set of existing URLs, counting network calls
pub struct StubProbe {
    exists: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl StubProbe {
    pub fn new(existing: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            exists: Mutex::new(existing.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_exists(&self, url: &str, exists: bool) {
        let mut set = self.exists.lock().unwrap();
        if exists {
            set.insert(url.to_string());
        } else {
            set.remove(url);
        }
    }
}

#[async_trait]
impl UrlProbe for StubProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.exists.lock().unwrap().contains(url) {
            ProbeOutcome::Exists
        } else {
            ProbeOutcome::Missing
        }
    }
}

/// Listing stub with a fixed file set, counting fetches
pub struct StaticListing {
    files: Vec<AudioFile>,
    fetches: AtomicUsize,
}

impl StaticListing {
    pub fn new(files: Vec<AudioFile>) -> Arc<Self> {
        Arc::new(Self {
            files,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileListing for StaticListing {
    async fn fetch(&self) -> Result<Vec<AudioFile>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.clone())
    }
}

pub fn audio_file(name: &str) -> AudioFile {
    AudioFile {
        name: name.to_string(),
        url: format!("https://cms.example.com/uploads/{name}"),
        mime: "audio/mpeg".to_string(),
    }
}

pub fn track(id: &str, title: &str) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
    }
}

pub fn stem(id: &str, name: &str) -> Stem {
    Stem {
        id: id.to_string(),
        name: name.to_string(),
        url: None,
        alternative_url: None,
    }
}

/// Wire a resolver against stub collaborators and a temp-dir cache
pub struct TestService {
    pub resolver: Resolver,
    pub cache: Arc<UrlCache>,
    pub state: Arc<SharedState>,
}

pub fn build_service(
    cache_dir: &Path,
    probe: Arc<StubProbe>,
    listing: Arc<StaticListing>,
) -> TestService {
    let config = Arc::new(ServiceConfig::default());
    let validator = StemValidator::new(Arc::new(config.heuristics.clone()));
    let cache = Arc::new(UrlCache::open(cache_dir.join("stem_url_cache.json")));
    let index = Arc::new(AudioFileIndex::new(listing));
    let state = Arc::new(SharedState::new());
    let generator = CandidateGenerator::new(config, validator.clone());
    let resolver = Resolver::new(cache.clone(), validator, generator, probe, index, state.clone());
    TestService {
        resolver,
        cache,
        state,
    }
}
