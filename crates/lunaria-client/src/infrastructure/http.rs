//! HTTP adapters over `reqwest`.
//!
//! - [`SeedApiClient`] implements [`PhotoSource`] against one seed's API
//!   (`/status`, `/photos`, `/photo/{name}`).
//! - [`HttpProber`] answers "is there a seed at this host?" for the active
//!   scanner by calling `GET /discovery`.
//!
//! Both reuse a single `reqwest::Client` (one connection pool) per instance.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use lunaria_core::protocol::DISCOVERY_PATH;
use lunaria_core::{decode_photo_list, decode_probe, decode_status, SeedIdentity, SeedStatus};
use reqwest::{Client, StatusCode, Url};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::debug;

use crate::application::sync_photos::{PhotoSource, SourceError, SyncTarget};
use crate::infrastructure::network::scanner::Prober;

/// Connect timeout for seed API requests.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Whole-request timeout for the small JSON endpoints.  Photo bodies are
/// not bounded by it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest silence tolerated while waiting for a photo's headers or its
/// next body chunk.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps a transport error onto the [`SourceError`] variants.
fn transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        SourceError::Unreachable(format!("connection failed: {e}"))
    } else if e.is_body() || e.is_decode() {
        SourceError::Interrupted(e.to_string())
    } else {
        SourceError::Unreachable(e.to_string())
    }
}

/// Client for one seed's photo API.
pub struct SeedApiClient {
    http_client: Client,
    base: Url,
    request_timeout: Duration,
    idle_timeout: Duration,
}

impl SeedApiClient {
    /// Creates a client for the API rooted at `base` (e.g. `http://10.0.0.5:4269`).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Endpoint`] if `base` is not an absolute
    /// HTTP(S) URL or the client cannot be built.
    pub fn new(base: &str, connect_timeout: Duration) -> Result<Self, SourceError> {
        let base = Url::parse(base).map_err(|e| SourceError::Endpoint(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(SourceError::Endpoint(format!("{base}: not an HTTP URL")));
        }
        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| SourceError::Endpoint(e.to_string()))?;
        Ok(Self {
            http_client,
            base,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        })
    }

    /// Client for the seed named by `target`.  Use this rather than
    /// [`new`](Self::new) when the client feeds a sync of that target, so
    /// both agree on the base URL.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn for_target(target: &SyncTarget, connect_timeout: Duration) -> Result<Self, SourceError> {
        Self::new(&target.remote_base, connect_timeout)
    }

    /// Overrides the timeout applied to `/status` and `/photos`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides how long a photo transfer may go without receiving data.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// The API base URL requests are built from.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `base` joined with `segments`, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::Endpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs a small JSON document and returns its raw body.
    async fn get_small(&self, segments: &[&str]) -> Result<Vec<u8>, SourceError> {
        let url = self.endpoint(segments)?;
        let response = self
            .http_client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() != StatusCode::OK {
            return Err(SourceError::HttpStatus(response.status().as_u16()));
        }
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl PhotoSource for SeedApiClient {
    async fn fetch_status(&self) -> Result<SeedStatus, SourceError> {
        let body = self.get_small(&["status"]).await?;
        Ok(decode_status(&body)?)
    }

    async fn list_photos(&self) -> Result<Vec<String>, SourceError> {
        let body = self.get_small(&["photos"]).await?;
        Ok(decode_photo_list(&body)?)
    }

    async fn fetch_photo(
        &self,
        name: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, SourceError> {
        let url = self.endpoint(&["photo", name])?;
        let stalled = || SourceError::Interrupted(format!("no data for {:?}", self.idle_timeout));

        let mut response = timeout(self.idle_timeout, self.http_client.get(url).send())
            .await
            .map_err(|_| stalled())?
            .map_err(transport_error)?;
        if response.status() != StatusCode::OK {
            return Err(SourceError::HttpStatus(response.status().as_u16()));
        }

        let mut written = 0u64;
        while let Some(chunk) = timeout(self.idle_timeout, response.chunk())
            .await
            .map_err(|_| stalled())?
            .map_err(transport_error)?
        {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}

/// Probes one host's `/discovery` endpoint.
pub struct HttpProber {
    http_client: Client,
    port: u16,
    timeout: Duration,
}

impl HttpProber {
    /// Creates a prober for `port` where every probe is bounded by
    /// `timeout` end to end and by `connect_timeout` for the TCP connect.
    pub fn new(port: u16, timeout: Duration, connect_timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout.min(timeout))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            port,
            timeout,
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, host: Ipv4Addr) -> Option<SeedIdentity> {
        let url = format!("http://{host}:{}{DISCOVERY_PATH}", self.port);

        let response = match self.http_client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("probe {url}: {e}");
                return None;
            }
        };
        if response.status() != StatusCode::OK {
            debug!("probe {url}: HTTP {}", response.status());
            return None;
        }
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                debug!("probe {url}: {e}");
                return None;
            }
        };
        match decode_probe(&body) {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!("probe {url}: not a seed ({e})");
                None
            }
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SeedApiClient {
        SeedApiClient::new(base, DEFAULT_CONNECT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments_to_base() {
        let c = client("http://10.0.0.5:4269");
        assert_eq!(
            c.endpoint(&["photos"]).unwrap().as_str(),
            "http://10.0.0.5:4269/photos"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let c = client("http://10.0.0.5:4269/api/");
        assert_eq!(
            c.endpoint(&["status"]).unwrap().as_str(),
            "http://10.0.0.5:4269/api/status"
        );
    }

    #[test]
    fn test_endpoint_percent_encodes_photo_name() {
        let c = client("http://10.0.0.5:4269");
        assert_eq!(
            c.endpoint(&["photo", "my photo#1.jpg"]).unwrap().as_str(),
            "http://10.0.0.5:4269/photo/my%20photo%231.jpg"
        );
    }

    #[test]
    fn test_for_target_uses_normalised_target_base() {
        // Arrange
        let target = SyncTarget::new("http://10.0.0.5:4269//", "/tmp/x", false).unwrap();

        // Act
        let c = SeedApiClient::for_target(&target, DEFAULT_CONNECT_TIMEOUT).unwrap();

        // Assert
        assert_eq!(c.base_url(), "http://10.0.0.5:4269/");
        assert_eq!(
            c.endpoint(&["photos"]).unwrap().as_str(),
            "http://10.0.0.5:4269/photos"
        );
    }

    #[test]
    fn test_timeouts_default_and_override() {
        let c = client("http://10.0.0.5:4269");
        assert_eq!(c.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(c.idle_timeout, DEFAULT_IDLE_TIMEOUT);

        let c = c
            .with_request_timeout(Duration::from_millis(250))
            .with_idle_timeout(Duration::from_millis(750));

        assert_eq!(c.request_timeout, Duration::from_millis(250));
        assert_eq!(c.idle_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_new_rejects_non_http_base() {
        assert!(matches!(
            SeedApiClient::new("ftp://10.0.0.5", DEFAULT_CONNECT_TIMEOUT),
            Err(SourceError::Endpoint(_))
        ));
        assert!(SeedApiClient::new("not a url", DEFAULT_CONNECT_TIMEOUT).is_err());
    }

    #[tokio::test]
    async fn test_probe_of_closed_port_returns_none() {
        // Port 9 (discard) on loopback is almost never listening.
        let prober = HttpProber::new(9, Duration::from_millis(500), Duration::from_millis(200));
        assert!(prober.probe(Ipv4Addr::LOCALHOST).await.is_none());
    }
}
