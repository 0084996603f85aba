//! Service configuration and matching heuristics
//!
//! The heuristic tables (legacy stem hashes, alias families, partial title
//! equivalences) are configuration data, not code: new legacy tracks are
//! added by editing the TOML config, never by touching the resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stemgate_common::Result;

/// Top-level service configuration, loaded from TOML with compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Origin used to absolutize same-origin candidate paths for probing
    pub site_base_url: String,
    /// Base under which legacy hash-table URLs are synthesized
    pub media_base_url: String,
    /// Media library listing endpoint (flat array of {name, url, mime})
    pub listing_url: String,
    /// Path segment identifying direct upload-host URLs
    pub uploads_segment: String,
    /// Same-origin prefix that the media proxy serves uploads under
    pub proxy_prefix: String,
    /// Durable stem URL cache location
    pub cache_path: PathBuf,
    /// Existence probe timeout
    pub probe_timeout_ms: u64,
    /// Matching heuristics
    pub heuristics: Heuristics,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            site_base_url: "http://localhost:3000".to_string(),
            media_base_url: "/api/media".to_string(),
            listing_url: "http://localhost:1337/api/upload/files".to_string(),
            uploads_segment: "/uploads/".to_string(),
            proxy_prefix: "/api/media/".to_string(),
            cache_path: stemgate_common::config::default_cache_path(),
            probe_timeout_ms: 5000,
            heuristics: Heuristics::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration: TOML file when one was resolved, compiled
    /// defaults otherwise.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        match config_file {
            Some(path) => stemgate_common::config::load_toml(path),
            None => Ok(Self::default()),
        }
    }
}

/// Declarative matching heuristics
///
/// Track titles are free text edited independently of the filenames uploaded
/// at different times, so exact equality is unreliable upstream. These
/// tables describe the accepted deviations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Families of interchangeable name spellings. When a track title
    /// contains any trigger, its files are matched through the alias list
    /// instead of plain substring checks.
    pub alias_families: Vec<AliasFamily>,
    /// Known partial-title equivalences between titles and filenames
    pub partial_equivalences: Vec<PartialEquivalence>,
    /// Per-track stem hash tables for legacy uploads whose filenames carry
    /// a content hash suffix
    pub legacy_tracks: Vec<LegacyTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasFamily {
    /// Normalized-title fragments that activate this family
    pub triggers: Vec<String>,
    /// Spellings accepted in filenames
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialEquivalence {
    /// Fragment looked for in the normalized track title
    pub title_fragment: String,
    /// Fragment accepted in the normalized filename
    pub file_fragment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyTrack {
    /// Track title as entered in the CMS
    pub title: String,
    /// Stem name -> upload hash suffix
    pub stem_hashes: BTreeMap<String, String>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            alias_families: vec![AliasFamily {
                triggers: vec!["lofi".to_string(), "lofibeat".to_string()],
                aliases: vec![
                    "lofi".to_string(),
                    "lofibeat".to_string(),
                    "lofibeats".to_string(),
                ],
            }],
            partial_equivalences: vec![
                PartialEquivalence {
                    title_fragment: "longopener".to_string(),
                    file_fragment: "opener".to_string(),
                },
                PartialEquivalence {
                    title_fragment: "mememusic".to_string(),
                    file_fragment: "meme".to_string(),
                },
            ],
            legacy_tracks: vec![
                LegacyTrack {
                    title: "Elevator Music".to_string(),
                    stem_hashes: BTreeMap::from([
                        ("Bass".to_string(), "6cb3bdeb25".to_string()),
                        ("Drums".to_string(), "91f2a6c04d".to_string()),
                        ("Melody".to_string(), "3e7d09b1aa".to_string()),
                        ("Chords".to_string(), "c54a88f2e1".to_string()),
                    ]),
                },
                LegacyTrack {
                    title: "Crazy Meme Music".to_string(),
                    stem_hashes: BTreeMap::from([
                        ("Bass".to_string(), "77d01c5aef".to_string()),
                        ("Drums".to_string(), "0f9e4d27b3".to_string()),
                        ("Melody".to_string(), "be32f6a90c".to_string()),
                    ]),
                },
                LegacyTrack {
                    title: "Lo-Fi Beats".to_string(),
                    stem_hashes: BTreeMap::from([
                        ("Bass".to_string(), "e8b160df37".to_string()),
                        ("Drums".to_string(), "5dc9a47e12".to_string()),
                        ("Keys".to_string(), "24af7c09d8".to_string()),
                    ]),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_legacy_catalog() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.proxy_prefix, "/api/media/");
        assert!(cfg
            .heuristics
            .legacy_tracks
            .iter()
            .any(|t| t.title == "Elevator Music"
                && t.stem_hashes.get("Bass").map(String::as_str) == Some("6cb3bdeb25")));
    }

    #[test]
    fn test_toml_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
site_base_url = "https://store.example.com"
probe_timeout_ms = 1500

[[heuristics.legacy_tracks]]
title = "Night Drive"

[heuristics.legacy_tracks.stem_hashes]
Bass = "00ff00ff00"
"#,
        )
        .unwrap();

        let cfg = ServiceConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.site_base_url, "https://store.example.com");
        assert_eq!(cfg.probe_timeout_ms, 1500);
        // TOML-provided tables replace the compiled defaults wholesale
        assert_eq!(cfg.heuristics.legacy_tracks.len(), 1);
        assert_eq!(cfg.heuristics.legacy_tracks[0].title, "Night Drive");
        // Untouched sections keep their defaults
        assert_eq!(cfg.proxy_prefix, "/api/media/");
    }
}
