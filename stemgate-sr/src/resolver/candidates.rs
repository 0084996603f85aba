//! Candidate URL generation
//!
//! Produces the ordered candidate URLs for each resolution tier without
//! performing any network calls. Probing and final validation belong to
//! the resolver.

use crate::config::ServiceConfig;
use crate::resolver::matching::{normalize, StemValidator};
use crate::resolver::proxy::to_proxy_url;
use std::sync::Arc;
use stemgate_common::{AudioFile, Stem, StemIdentity};

pub struct CandidateGenerator {
    config: Arc<ServiceConfig>,
    validator: StemValidator,
}

impl CandidateGenerator {
    pub fn new(config: Arc<ServiceConfig>, validator: StemValidator) -> Self {
        Self { config, validator }
    }

    /// Tier "hash-table": legacy tracks whose uploads carry a known content
    /// hash suffix. Synthesizes `<base>/<Stem>_<Track_title>_<hash>.mp3`.
    pub fn hash_table(&self, identity: &StemIdentity) -> Vec<String> {
        let title_norm = normalize(&identity.track_title);
        let base = self.config.media_base_url.trim_end_matches('/');

        self.config
            .heuristics
            .legacy_tracks
            .iter()
            .filter(|track| normalize(&track.title) == title_norm)
            .filter_map(|track| track.stem_hashes.get(&identity.stem_name))
            .map(|hash| {
                format!(
                    "{base}/{}_{}_{hash}.mp3",
                    identity.stem_name,
                    filename_title(&identity.track_title)
                )
            })
            .collect()
    }

    /// Tier "declared-url": the stem's own URL field, proxy-converted.
    pub fn declared(&self, stem: &Stem) -> Vec<String> {
        stem.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| self.proxied(url))
            .into_iter()
            .collect()
    }

    /// Tier "alternative-urls": the stem's JSON-encoded fallback list,
    /// each entry proxy-converted.
    pub fn alternatives(&self, stem: &Stem) -> Vec<String> {
        stem.alternative_urls()
            .iter()
            .filter(|url| !url.trim().is_empty())
            .map(|url| self.proxied(url))
            .collect()
    }

    /// Tier "file-search": every known audio file whose name contains the
    /// stem name and matches the track title under the validator rules.
    pub fn file_search(&self, identity: &StemIdentity, files: &[AudioFile]) -> Vec<String> {
        let stem_norm = normalize(&identity.stem_name);
        let title_norm = normalize(&identity.track_title);
        if stem_norm.is_empty() || title_norm.is_empty() {
            return Vec::new();
        }

        files
            .iter()
            .filter(|file| {
                let name_norm = normalize(&file.name);
                name_norm.contains(&stem_norm)
                    && self.validator.title_matches(&title_norm, &name_norm)
            })
            .map(|file| self.proxied(&file.url))
            .collect()
    }

    fn proxied(&self, url: &str) -> String {
        to_proxy_url(url, &self.config.uploads_segment, &self.config.proxy_prefix)
    }
}

/// Track title as it appears in legacy upload filenames: first character
/// uppercased, the rest lowercased, spaces replaced by underscores.
/// "Elevator Music" -> "Elevator_music"
fn filename_title(title: &str) -> String {
    let trimmed = title.trim();
    let mut chars = trimmed.chars();
    let cased = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    };
    cased.replace(' ', "_")
}
