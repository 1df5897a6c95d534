use reqwest::{Client, Response};
use std::time::Duration;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Channel, StreamCheck};
use crate::services::playlist::parse_playlist;

/// What a relayed stream is for. Selects the connect bound and the
/// content-type defaults applied by the route layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPurpose {
    Live,
    Download,
    Epg,
}

/// Fetch-and-forward service for remote playlists, streams and EPG documents.
///
/// Holds a single shared HTTP client; every operation is independent and the
/// service keeps no cross-request state. Nothing here retries - transient
/// upstream failure is the caller's problem.
pub struct RelayService {
    client: Client,
    playlist_fetch_timeout: Duration,
    stream_timeout: Duration,
    download_timeout: Duration,
    epg_timeout: Duration,
    check_timeout: Duration,
}

impl RelayService {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            playlist_fetch_timeout: Duration::from_millis(config.playlist_fetch_timeout_ms),
            stream_timeout: Duration::from_millis(config.stream_timeout_ms),
            download_timeout: Duration::from_millis(config.download_timeout_ms),
            epg_timeout: Duration::from_millis(config.epg_timeout_ms),
            check_timeout: Duration::from_millis(config.check_timeout_ms),
        }
    }

    /// Percent-decode a caller-supplied locator and require an http(s) scheme
    pub fn decode_locator(url: &str) -> Result<String, ApiError> {
        if url.trim().is_empty() {
            return Err(ApiError::BadRequest("url is required".to_string()));
        }

        let decoded = urlencoding::decode(url)
            .map_err(|_| ApiError::BadRequest("Invalid URL encoding".to_string()))?
            .into_owned();

        if !decoded.starts_with("http://") && !decoded.starts_with("https://") {
            return Err(ApiError::BadRequest("Invalid URL format".to_string()));
        }

        Ok(decoded)
    }

    /// Fetch a remote playlist document and parse it into channel records
    pub async fn fetch_playlist(&self, url: &str) -> Result<Vec<Channel>, ApiError> {
        let target = Self::decode_locator(url)?;
        tracing::info!("Fetching playlist: {}", target);

        let response = self
            .client
            .get(&target)
            .timeout(self.playlist_fetch_timeout)
            .send()
            .await
            .map_err(ApiError::from_upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UpstreamFetch(format!(
                "upstream returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(ApiError::from_upstream)?;
        Ok(parse_playlist(&body))
    }

    /// Fetch an EPG document, fully buffered.
    ///
    /// Deliberately not streamed: the whole body is read so the route can
    /// hand it back with a forced XML content-type.
    pub async fn fetch_epg(&self, url: &str) -> Result<String, ApiError> {
        let target = Self::decode_locator(url)?;
        tracing::info!("Fetching EPG: {}", target);

        let response = self
            .client
            .get(&target)
            .timeout(self.epg_timeout)
            .send()
            .await
            .map_err(ApiError::from_upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UpstreamFetch(format!(
                "upstream returned HTTP {}",
                status.as_u16()
            )));
        }

        response.text().await.map_err(ApiError::from_upstream)
    }

    /// Open a streaming GET against the remote locator.
    ///
    /// The bound covers connecting and receiving the response head only;
    /// body bytes flow for as long as both sides keep the connection open,
    /// so a live stream is never cut off by a total-request deadline.
    pub async fn open_stream(
        &self,
        url: &str,
        purpose: StreamPurpose,
    ) -> Result<Response, ApiError> {
        let target = Self::decode_locator(url)?;
        let bound = match purpose {
            StreamPurpose::Live => self.stream_timeout,
            StreamPurpose::Download => self.download_timeout,
            StreamPurpose::Epg => self.epg_timeout,
        };

        tracing::debug!("Relaying ({:?}): {}", purpose, target);

        let response = tokio::time::timeout(bound, self.client.get(&target).send())
            .await
            .map_err(|_| ApiError::UpstreamTimeout)?
            .map_err(ApiError::from_upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UpstreamFetch(format!(
                "upstream returned HTTP {}",
                status.as_u16()
            )));
        }

        Ok(response)
    }

    /// Probe a stream with a metadata-only HEAD request.
    ///
    /// Never fails: any error is folded into an `alive: false` result.
    pub async fn check_stream(&self, url: &str) -> StreamCheck {
        let target = match Self::decode_locator(url) {
            Ok(t) => t,
            Err(e) => return StreamCheck::dead(e.to_string()),
        };

        match self
            .client
            .head(&target)
            .timeout(self.check_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    let content_type = response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(|s| s.to_string());
                    StreamCheck::alive(status.as_u16(), content_type)
                } else {
                    StreamCheck::dead(format!("HTTP {}", status.as_u16()))
                }
            }
            Err(e) => StreamCheck::dead(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            port: 0,
            allowed_origins: "*".to_string(),
            playlist_fetch_timeout_ms: 2_000,
            stream_timeout_ms: 2_000,
            download_timeout_ms: 2_000,
            epg_timeout_ms: 2_000,
            check_timeout_ms: 2_000,
            max_upload_size_mb: 50,
            rate_limit_enabled: false,
            rate_limit_period_ms: 600,
            rate_limit_burst: 100,
            user_agent: "test-agent".to_string(),
        }
    }

    #[test]
    fn test_decode_locator() {
        let decoded =
            RelayService::decode_locator("http%3A%2F%2Fhost%2Fstream.ts%3Ftoken%3Dabc").unwrap();
        assert_eq!(decoded, "http://host/stream.ts?token=abc");

        // already-decoded locators pass through
        let plain = RelayService::decode_locator("http://host/stream.ts").unwrap();
        assert_eq!(plain, "http://host/stream.ts");
    }

    #[test]
    fn test_decode_locator_rejects_bad_input() {
        assert!(RelayService::decode_locator("").is_err());
        assert!(RelayService::decode_locator("   ").is_err());
        assert!(RelayService::decode_locator("ftp://host/file").is_err());
        assert!(RelayService::decode_locator("not a url").is_err());
    }

    #[tokio::test]
    async fn test_check_stream_unreachable_host_is_dead() {
        let relay = RelayService::new(&test_config());

        // nothing listens on the discard port
        let result = relay.check_stream("http://127.0.0.1:9/stream.ts").await;

        assert!(!result.alive);
        assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert!(result.status.is_none());
    }

    #[tokio::test]
    async fn test_check_stream_invalid_locator_is_dead() {
        let relay = RelayService::new(&test_config());
        let result = relay.check_stream("file:///etc/passwd").await;

        assert!(!result.alive);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_open_stream_unreachable_reports_failure() {
        let relay = RelayService::new(&test_config());
        let result = relay
            .open_stream("http://127.0.0.1:9/live.ts", StreamPurpose::Live)
            .await;

        assert!(result.is_err());
    }
}
