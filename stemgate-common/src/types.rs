//! Descriptor types consumed from the storefront CMS
//!
//! Tracks and stems arrive as CMS-entered free text: titles and stem names
//! are not normalized upstream, and stem URLs may be absent or point at
//! files uploaded long after the track was titled. Everything here treats
//! those fields as untrusted strings.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track descriptor as served by the CMS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// CMS-issued identifier (opaque string, authoritative for uniqueness)
    pub id: String,
    /// Display title (free text)
    pub title: String,
}

/// Stem descriptor as served by the CMS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stem {
    /// CMS-issued identifier
    pub id: String,
    /// Stem name, e.g. "Drums" or "Bass" (free text)
    pub name: String,
    /// Declared media URL, if the CMS has one on record
    #[serde(default)]
    pub url: Option<String>,
    /// JSON-encoded array of fallback URLs, stored verbatim by the CMS
    #[serde(default, rename = "alternativeUrl")]
    pub alternative_url: Option<String>,
}

impl Stem {
    /// Parse the JSON-encoded alternative URL list.
    ///
    /// The CMS stores this field as a raw string; malformed JSON yields an
    /// empty list with a warning rather than an error, since a bad fallback
    /// list must not block resolution through the other tiers.
    pub fn alternative_urls(&self) -> Vec<String> {
        let Some(raw) = self.alternative_url.as_deref() else {
            return Vec::new();
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(
                    stem = %self.name,
                    error = %e,
                    "Malformed alternativeUrl JSON, ignoring"
                );
                Vec::new()
            }
        }
    }
}

/// One entry of the media library listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub mime: String,
}

impl AudioFile {
    /// Whether this listing entry is audio at all.
    ///
    /// Listings include images and archives; a missing mime falls back to
    /// the filename extension.
    pub fn is_audio(&self) -> bool {
        if self.mime.starts_with("audio/") {
            return true;
        }
        if !self.mime.is_empty() {
            return false;
        }
        let lower = self.name.to_lowercase();
        ["mp3", "wav", "ogg", "flac", "m4a", "aac"]
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    }
}

/// Natural key for stem caching and validation
///
/// `track_id` is authoritative for uniqueness; `track_title` and `stem_name`
/// participate only in heuristic filename matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemIdentity {
    pub track_id: String,
    pub track_title: String,
    pub stem_name: String,
}

impl StemIdentity {
    /// Build an identity from a track/stem pair.
    ///
    /// Blank components are rejected up front so resolution never issues
    /// network calls for an unidentifiable stem.
    pub fn new(track: &Track, stem: &Stem) -> Result<Self> {
        Self::from_parts(&track.id, &track.title, &stem.name)
    }

    pub fn from_parts(track_id: &str, track_title: &str, stem_name: &str) -> Result<Self> {
        if track_id.trim().is_empty() || track_title.trim().is_empty() {
            return Err(Error::InvalidInput(
                "track id and title are required for stem resolution".to_string(),
            ));
        }
        if stem_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "stem name is required for stem resolution".to_string(),
            ));
        }
        Ok(Self {
            track_id: track_id.to_string(),
            track_title: track_title.to_string(),
            stem_name: stem_name.to_string(),
        })
    }

    /// Serialized cache key: `trackId:trackTitle:stemName`
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.track_id, self.track_title, self.stem_name)
    }

    /// Reconstruct an identity from a cache key.
    ///
    /// Returns None for keys that do not split into three parts; such
    /// entries are purged during the cache init scan.
    pub fn from_cache_key(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, ':');
        let track_id = parts.next()?;
        let track_title = parts.next()?;
        let stem_name = parts.next()?;
        Self::from_parts(track_id, track_title, stem_name).ok()
    }
}

impl fmt::Display for StemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stem '{}' of track '{}'", self.stem_name, self.track_title)
    }
}

/// Resolution tiers, in the order the resolver tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateTier {
    Cached,
    HashTable,
    DeclaredUrl,
    AlternativeUrls,
    FileSearch,
}

impl fmt::Display for CandidateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CandidateTier::Cached => "cached",
            CandidateTier::HashTable => "hash-table",
            CandidateTier::DeclaredUrl => "declared-url",
            CandidateTier::AlternativeUrls => "alternative-urls",
            CandidateTier::FileSearch => "file-search",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_round_trip() {
        let identity = StemIdentity::from_parts("t1", "Elevator Music", "Bass").unwrap();
        let key = identity.cache_key();
        assert_eq!(key, "t1:Elevator Music:Bass");

        let parsed = StemIdentity::from_cache_key(&key).unwrap();
        assert_eq!(parsed, identity);
    }

    #[test]
    fn test_blank_identity_rejected() {
        assert!(StemIdentity::from_parts("", "Elevator Music", "Bass").is_err());
        assert!(StemIdentity::from_parts("t1", "  ", "Bass").is_err());
        assert!(StemIdentity::from_parts("t1", "Elevator Music", "").is_err());
    }

    #[test]
    fn test_malformed_cache_key_rejected() {
        assert!(StemIdentity::from_cache_key("t1:only-two-parts").is_none());
        assert!(StemIdentity::from_cache_key("").is_none());
    }

    #[test]
    fn test_alternative_urls_lenient_parse() {
        let stem = Stem {
            id: "s1".to_string(),
            name: "Drums".to_string(),
            url: None,
            alternative_url: Some(r#"["https://a/x.mp3","https://b/y.mp3"]"#.to_string()),
        };
        assert_eq!(stem.alternative_urls().len(), 2);

        let broken = Stem {
            alternative_url: Some("not json".to_string()),
            ..stem.clone()
        };
        assert!(broken.alternative_urls().is_empty());

        let absent = Stem {
            alternative_url: None,
            ..stem
        };
        assert!(absent.alternative_urls().is_empty());
    }

    #[test]
    fn test_audio_file_mime_detection() {
        let by_mime = AudioFile {
            name: "x.bin".to_string(),
            url: "/u/x.bin".to_string(),
            mime: "audio/mpeg".to_string(),
        };
        assert!(by_mime.is_audio());

        let by_extension = AudioFile {
            name: "Drums_lofibeats_demo.mp3".to_string(),
            url: "/u/d.mp3".to_string(),
            mime: String::new(),
        };
        assert!(by_extension.is_audio());

        let image = AudioFile {
            name: "cover.png".to_string(),
            url: "/u/cover.png".to_string(),
            mime: "image/png".to_string(),
        };
        assert!(!image.is_audio());
    }
}
