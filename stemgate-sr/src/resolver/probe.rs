//! URL existence probing
//!
//! A lightweight HEAD request decides whether a candidate URL is worth
//! handing to a player. The contract is fail-open: anything that is not a
//! 2xx falls through to the next candidate. `Missing` and `Unreachable`
//! are treated identically by the resolver but logged apart, so transient
//! connectivity trouble is distinguishable from genuine absence in the
//! logs.

use async_trait::async_trait;
use std::time::Duration;
use stemgate_common::{Error, Result};
use tracing::debug;
use url::Url;

/// Outcome of an existence probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx response
    Exists,
    /// Non-2xx response
    Missing,
    /// Transport-level failure (DNS, refused, timeout)
    Unreachable,
}

impl ProbeOutcome {
    pub fn exists(self) -> bool {
        self == ProbeOutcome::Exists
    }
}

/// Existence checker seam; production uses HTTP HEAD, tests use stubs.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// HEAD-request prober
pub struct HttpUrlProbe {
    client: reqwest::Client,
    /// Origin used to absolutize same-origin candidate paths
    site_base: String,
}

impl HttpUrlProbe {
    pub fn new(site_base: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stemgate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            site_base: site_base.trim_end_matches('/').to_string(),
        })
    }

    /// Candidates in proxy form are same-origin paths; join them onto the
    /// configured site origin so they are probeable.
    fn absolutize(&self, url: &str) -> String {
        if Url::parse(url).is_ok() {
            url.to_string()
        } else {
            format!("{}/{}", self.site_base, url.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl UrlProbe for HttpUrlProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let target = self.absolutize(url);
        match self.client.head(&target).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Exists,
            Ok(response) => {
                debug!(url = %target, status = %response.status(), "Probe: not available");
                ProbeOutcome::Missing
            }
            Err(e) => {
                debug!(url = %target, error = %e, "Probe: unreachable");
                ProbeOutcome::Unreachable
            }
        }
    }
}
