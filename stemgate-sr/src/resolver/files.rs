//! Media library listing and in-memory file index
//!
//! The file-search tier works against a flat listing of every uploaded
//! media file. The listing is fetched once and held in memory for the
//! process lifetime; `refresh` forces a refetch when a consumer suspects
//! the library changed underneath it.

use async_trait::async_trait;
use std::sync::Arc;
use stemgate_common::{AudioFile, Error, Result};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Listing collaborator seam; production GETs the CMS upload listing.
#[async_trait]
pub trait FileListing: Send + Sync {
    async fn fetch(&self) -> Result<Vec<AudioFile>>;
}

/// HTTP listing client
pub struct HttpFileListing {
    client: reqwest::Client,
    listing_url: String,
}

impl HttpFileListing {
    pub fn new(listing_url: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stemgate/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            listing_url: listing_url.to_string(),
        })
    }
}

#[async_trait]
impl FileListing for HttpFileListing {
    async fn fetch(&self) -> Result<Vec<AudioFile>> {
        let response = self
            .client
            .get(&self.listing_url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("listing fetch failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "listing fetch failed: HTTP {}",
                response.status()
            )));
        }
        response
            .json::<Vec<AudioFile>>()
            .await
            .map_err(|e| Error::Http(format!("listing decode failed: {e}")))
    }
}

/// Process-lifetime cache over the listing
pub struct AudioFileIndex {
    source: Arc<dyn FileListing>,
    cached: RwLock<Option<Arc<Vec<AudioFile>>>>,
}

impl AudioFileIndex {
    pub fn new(source: Arc<dyn FileListing>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Return the audio files known to the library.
    ///
    /// First call fetches and caches; later calls reuse the cached list.
    /// A failed fetch yields an empty list without caching it, so the next
    /// resolution retries.
    pub async fn files(&self) -> Arc<Vec<AudioFile>> {
        if let Some(files) = self.cached.read().await.clone() {
            return files;
        }

        let mut slot = self.cached.write().await;
        // Another resolution may have fetched while we waited for the lock
        if let Some(files) = slot.clone() {
            return files;
        }

        match self.source.fetch().await {
            Ok(all) => {
                let audio: Vec<AudioFile> = all.into_iter().filter(AudioFile::is_audio).collect();
                debug!(files = audio.len(), "Fetched media library listing");
                let files = Arc::new(audio);
                *slot = Some(files.clone());
                files
            }
            Err(e) => {
                warn!(error = %e, "Media library listing unavailable, file search disabled");
                Arc::new(Vec::new())
            }
        }
    }

    /// Drop the cached listing; the next `files` call refetches.
    pub async fn refresh(&self) {
        *self.cached.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListing {
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl FileListing for CountingListing {
        async fn fetch(&self) -> Result<Vec<AudioFile>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Http("boom".to_string()));
            }
            Ok(vec![
                AudioFile {
                    name: "Drums_lofibeats_demo.mp3".to_string(),
                    url: "https://cms.example.com/uploads/Drums_lofibeats_demo.mp3".to_string(),
                    mime: "audio/mpeg".to_string(),
                },
                AudioFile {
                    name: "cover.png".to_string(),
                    url: "https://cms.example.com/uploads/cover.png".to_string(),
                    mime: "image/png".to_string(),
                },
            ])
        }
    }

    #[tokio::test]
    async fn test_listing_fetched_once_and_filtered_to_audio() {
        let source = Arc::new(CountingListing {
            fetches: AtomicUsize::new(0),
            fail: false,
        });
        let index = AudioFileIndex::new(source.clone());

        let first = index.files().await;
        let second = index.files().await;

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "Drums_lofibeats_demo.mp3");
        assert_eq!(second.len(), 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_forces_refetch() {
        let source = Arc::new(CountingListing {
            fetches: AtomicUsize::new(0),
            fail: false,
        });
        let index = AudioFileIndex::new(source.clone());

        index.files().await;
        index.refresh().await;
        index.files().await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_empty_and_retried() {
        let source = Arc::new(CountingListing {
            fetches: AtomicUsize::new(0),
            fail: true,
        });
        let index = AudioFileIndex::new(source.clone());

        assert!(index.files().await.is_empty());
        assert!(index.files().await.is_empty());
        // Failure was not cached
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}
