//! Normalized string matching between stem identities and filenames
//!
//! Track titles and filenames are entered independently in the CMS, often
//! months apart, so equality is hopeless. Matching works on normalized
//! strings (lowercased, non-alphanumerics stripped) and accepts configured
//! alias spellings and partial-title equivalences, while still rejecting
//! unrelated tracks that happen to share a generic stem name like "Drums".

use crate::config::Heuristics;
use std::sync::Arc;
use stemgate_common::StemIdentity;
use url::Url;

/// Lowercase and strip everything that is not ASCII alphanumeric
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Extract the filename from a URL.
///
/// Absolute URLs go through a real parser; same-origin paths and anything
/// the parser rejects fall back to splitting on `/`. Query and fragment are
/// dropped in the fallback, and percent-escapes are decoded either way.
pub fn filename_of(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let raw = match Url::parse(trimmed) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(String::from)),
        Err(_) => {
            let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
            path.rsplit('/').find(|s| !s.is_empty()).map(String::from)
        }
    }?;

    let decoded = urlencoding::decode(&raw)
        .map(|s| s.into_owned())
        .unwrap_or(raw);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Validates whether a URL plausibly belongs to a given stem identity
#[derive(Clone)]
pub struct StemValidator {
    heuristics: Arc<Heuristics>,
}

impl StemValidator {
    pub fn new(heuristics: Arc<Heuristics>) -> Self {
        Self { heuristics }
    }

    /// `true` iff the URL's filename matches both the stem name and the
    /// track title under the heuristic rules. Fails closed on anything
    /// unparseable.
    pub fn validate(&self, identity: &StemIdentity, url: &str) -> bool {
        let Some(filename) = filename_of(url) else {
            return false;
        };
        let file_norm = normalize(&filename);
        if file_norm.is_empty() {
            return false;
        }

        let stem_norm = normalize(&identity.stem_name);
        if stem_norm.is_empty() || !file_norm.contains(&stem_norm) {
            return false;
        }

        self.title_matches(&normalize(&identity.track_title), &file_norm)
    }

    /// Track-title membership with tie-break rules, evaluated in order:
    /// 1. alias family (title containing a trigger must match via aliases)
    /// 2. substring either way
    /// 3. partial-title equivalence table
    pub fn title_matches(&self, title_norm: &str, file_norm: &str) -> bool {
        if title_norm.is_empty() || file_norm.is_empty() {
            return false;
        }

        for family in &self.heuristics.alias_families {
            let triggered = family
                .triggers
                .iter()
                .any(|t| title_norm.contains(&normalize(t)));
            if triggered {
                return family
                    .aliases
                    .iter()
                    .any(|a| file_norm.contains(&normalize(a)));
            }
        }

        if file_norm.contains(title_norm) || title_norm.contains(file_norm) {
            return true;
        }

        self.heuristics.partial_equivalences.iter().any(|eq| {
            title_norm.contains(&normalize(&eq.title_fragment))
                && file_norm.contains(&normalize(&eq.file_fragment))
        })
    }
}
