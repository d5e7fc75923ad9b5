//! Cookie-bearing upstream session.
//!
//! # Responsibilities
//! - Build an HTTP client with the fixed browser header set and a cookie store
//! - Visit the upstream landing page once so it hands out its anti-bot cookies
//! - Fetch API paths as JSON through that session
//! - Replace the whole session on demand
//!
//! In-flight fetches keep the client handle they started with; `reset` swaps
//! the handle under a write lock and never mutates a live session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::config::ProxyConfig;
use crate::upstream::error::{UpstreamError, UpstreamResult};

/// Access to the upstream through a session.
///
/// The client only ever talks to the upstream through this trait, so tests
/// can script transport failures deterministically.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// GET `path` with the current session and parse the body as JSON.
    ///
    /// Fails with [`UpstreamError::Transport`] on network errors or a
    /// non-success status, and with [`UpstreamError::Parse`] on a body that
    /// is not JSON.
    async fn fetch_json(&self, path: &str) -> UpstreamResult<Value>;

    /// Drop the current session and establish a fresh one.
    async fn reset(&self) -> UpstreamResult<()>;
}

/// Everything needed to build a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub base_url: Url,
    pub warmup_url: Url,
    pub headers: HeaderMap,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &ProxyConfig) -> UpstreamResult<Self> {
        let base_url = parse_url("upstream.base_url", &config.upstream.base_url)?;
        let warmup_url = parse_url("upstream.warmup_url", &config.upstream.warmup_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("user-agent", &config.upstream.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("accept-language", &config.upstream.accept_language)?,
        );

        Ok(Self {
            base_url,
            warmup_url,
            headers,
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            request_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        })
    }
}

fn parse_url(field: &str, value: &str) -> UpstreamResult<Url> {
    Url::parse(value).map_err(|e| UpstreamError::Session(format!("{} '{}': {}", field, value, e)))
}

fn header_value(name: &str, value: &str) -> UpstreamResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| UpstreamError::Session(format!("invalid {} header: {}", name, e)))
}

/// Live session against the upstream site, backed by `reqwest`.
pub struct HttpSession {
    settings: SessionSettings,
    client: RwLock<reqwest::Client>,
    generation: AtomicU64,
}

impl HttpSession {
    /// Build the transport and run the warm-up request.
    ///
    /// Only a failure to construct the transport is an error. A failed
    /// warm-up is logged; the next fetch reports the real problem.
    pub async fn establish(settings: SessionSettings) -> UpstreamResult<Self> {
        let client = Self::handshake(&settings).await?;
        Ok(Self {
            settings,
            client: RwLock::new(client),
            generation: AtomicU64::new(1),
        })
    }

    /// Number of sessions established so far, including the current one.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    async fn handshake(settings: &SessionSettings) -> UpstreamResult<reqwest::Client> {
        let client = reqwest::Client::builder()
            .default_headers(settings.headers.clone())
            .cookie_store(true)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| UpstreamError::Session(e.to_string()))?;

        match client.get(settings.warmup_url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                let _ = response.bytes().await;
                tracing::debug!(
                    url = %settings.warmup_url,
                    status = %status,
                    "Session warm-up complete"
                );
            }
            Err(e) => {
                tracing::warn!(
                    url = %settings.warmup_url,
                    error = %e,
                    "Session warm-up request failed"
                );
            }
        }

        Ok(client)
    }
}

#[async_trait]
impl SessionTransport for HttpSession {
    async fn fetch_json(&self, path: &str) -> UpstreamResult<Value> {
        let url = self
            .settings
            .base_url
            .join(path)
            .map_err(|e| UpstreamError::Transport(format!("invalid path '{}': {}", path, e)))?;

        let client = self.client.read().await.clone();

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Transport(format!("HTTP {} for {}", status, path)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| UpstreamError::Parse(e.to_string()))
    }

    async fn reset(&self) -> UpstreamResult<()> {
        let fresh = Self::handshake(&self.settings).await?;
        *self.client.write().await = fresh;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(generation, "Upstream session re-established");
        Ok(())
    }
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("base_url", &self.settings.base_url.as_str())
            .field("warmup_url", &self.settings.warmup_url.as_str())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_default_config() {
        let settings = SessionSettings::from_config(&ProxyConfig::default()).unwrap();
        assert_eq!(settings.base_url.as_str(), "https://www.nseindia.com/");
        assert!(settings.headers[USER_AGENT]
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
        assert_eq!(settings.request_timeout, Duration::from_secs(15));
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_settings_reject_bad_url() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "not a url".into();
        let err = SessionSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, UpstreamError::Session(_)));
    }

    #[tokio::test]
    async fn test_establish_tolerates_unreachable_warmup() {
        let mut config = ProxyConfig::default();
        // Port 9 (discard) on localhost is closed on test machines.
        config.upstream.base_url = "http://127.0.0.1:9".into();
        config.upstream.warmup_url = "http://127.0.0.1:9/".into();
        config.timeouts.connect_secs = 1;
        config.timeouts.upstream_secs = 1;

        let settings = SessionSettings::from_config(&config).unwrap();
        let session = HttpSession::establish(settings).await.unwrap();
        assert_eq!(session.generation(), 1);

        let err = session.fetch_json("/api/anything").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
