//! Upstream client: the five market operations on top of a session.
//!
//! # Data Flow
//! ```text
//! operation(key)
//!     → endpoints.rs (build path)
//!     → fetch: session.fetch_json(path)
//!         → transport failure: reset session, retry once
//!     → shapes.rs (validate & flatten)
//!     → ResultSet
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::ProxyConfig;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::upstream::endpoints::{self, Endpoint};
use crate::upstream::error::{UpstreamError, UpstreamResult};
use crate::upstream::history::{previous_session, HistoryQuery, HistorySource};
use crate::upstream::record::ResultSet;
use crate::upstream::session::{HttpSession, SessionSettings, SessionTransport};
use crate::upstream::shapes;

/// Live-market answer: full records, or just their symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiveMarket {
    Records(ResultSet),
    Symbols(Vec<String>),
}

/// Client for the upstream market endpoints.
pub struct UpstreamClient {
    session: Arc<dyn SessionTransport>,
    /// Serializes reset-then-retry sequences across concurrent callers.
    recovery: Mutex<()>,
    /// Bumped after every successful reset.
    epoch: AtomicU64,
    retry: RetryPolicy,
    history_attempts: u32,
    history_source: Option<Arc<dyn HistorySource>>,
}

impl UpstreamClient {
    pub fn new(session: Arc<dyn SessionTransport>, config: &ProxyConfig) -> Self {
        Self {
            session,
            recovery: Mutex::new(()),
            epoch: AtomicU64::new(0),
            retry: RetryPolicy::new(&config.retries),
            history_attempts: config.history.max_attempts,
            history_source: None,
        }
    }

    /// Establish an [`HttpSession`] from `config` and build a client on it.
    pub async fn connect(config: &ProxyConfig) -> UpstreamResult<Self> {
        let settings = SessionSettings::from_config(config)?;
        let session = HttpSession::establish(settings).await?;
        Ok(Self::new(Arc::new(session), config))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Use `source` for equity history instead of the upstream's own
    /// historical endpoint.
    pub fn with_history_source(mut self, source: Arc<dyn HistorySource>) -> Self {
        self.history_source = Some(source);
        self
    }

    /// Pre-open snapshot for a market segment (`NIFTY`, `FO`, ...).
    pub async fn pre_market(&self, key: &str) -> UpstreamResult<ResultSet> {
        let body = self
            .fetch(Endpoint::PreMarket, &endpoints::pre_market_path(key))
            .await?;
        shapes::pre_market_records(body)
    }

    /// Live snapshot of an index or sector.
    pub async fn live_market(&self, key: &str, symbols_only: bool) -> UpstreamResult<LiveMarket> {
        let body = self
            .fetch(Endpoint::LiveMarket, &endpoints::live_market_path(key))
            .await?;
        let records = shapes::live_market_records(body)?;
        if symbols_only {
            Ok(LiveMarket::Symbols(shapes::symbols(
                Endpoint::LiveMarket,
                &records,
            )?))
        } else {
            Ok(LiveMarket::Records(records))
        }
    }

    /// Holiday calendar (`trading`, `clearing`).
    pub async fn holiday(&self, calendar_type: &str) -> UpstreamResult<ResultSet> {
        let body = self
            .fetch(Endpoint::Holiday, &endpoints::holiday_path(calendar_type))
            .await?;
        shapes::holiday_records(body)
    }

    /// Option chain for an equity, or an index when `is_index` is set.
    pub async fn option_chain(&self, symbol: &str, is_index: bool) -> UpstreamResult<ResultSet> {
        let body = self
            .fetch(
                Endpoint::OptionChain,
                &endpoints::option_chain_path(symbol, is_index),
            )
            .await?;
        shapes::option_chain_records(body)
    }

    /// History of the nearest trading day at or before `date`.
    pub async fn equity_history(
        &self,
        symbol: &str,
        series: &str,
        date: NaiveDate,
    ) -> UpstreamResult<ResultSet> {
        let query = HistoryQuery::new(symbol, series, date);
        let source: &dyn HistorySource = match &self.history_source {
            Some(source) => source.as_ref(),
            None => self,
        };

        let lookup = previous_session(source, &query, self.history_attempts).await?;
        metrics::record_history_attempts(lookup.attempts);

        match lookup.found_on {
            Some(day) => tracing::debug!(
                symbol = %query.symbol,
                series = %query.series,
                day = %day,
                attempts = lookup.attempts,
                "History found"
            ),
            None => tracing::info!(
                symbol = %query.symbol,
                series = %query.series,
                date = %query.date,
                attempts = lookup.attempts,
                "No trading data in search window"
            ),
        }

        Ok(lookup.records)
    }

    /// Fetch `path`, re-establishing the session and retrying once on a
    /// transport failure.
    ///
    /// Callers that failed on the same stale session share one reset: the
    /// first to take the recovery lock replaces the session, the rest see
    /// the epoch moved on and go straight to their retry.
    async fn fetch(&self, endpoint: Endpoint, path: &str) -> UpstreamResult<Value> {
        let name = endpoint.as_str();
        let mut attempt = 0;
        // Held from the reset until the retry completes.
        let mut recovery_guard: Option<MutexGuard<'_, ()>> = None;

        loop {
            attempt += 1;
            let epoch = self.epoch.load(Ordering::Acquire);
            match self.session.fetch_json(path).await {
                Ok(body) => {
                    let outcome = if recovery_guard.is_some() { "recovered" } else { "ok" };
                    metrics::record_upstream_call(name, outcome);
                    return Ok(body);
                }
                Err(error) if self.retry.should_retry(attempt, &error) => {
                    tracing::warn!(
                        endpoint = name,
                        path,
                        attempt,
                        error = %error,
                        "Upstream transport failure, re-establishing session"
                    );
                    let guard = self.recovery.lock().await;
                    if self.epoch.load(Ordering::Acquire) == epoch {
                        tokio::time::sleep(self.retry.delay(attempt)).await;
                        if let Err(e) = self.session.reset().await {
                            metrics::record_upstream_call(name, e.kind());
                            return Err(e);
                        }
                        self.epoch.fetch_add(1, Ordering::AcqRel);
                        metrics::record_session_reset();
                    } else {
                        tracing::debug!(endpoint = name, path, "Session already re-established");
                    }
                    recovery_guard = Some(guard);
                }
                Err(UpstreamError::Transport(reason)) => {
                    tracing::error!(endpoint = name, path, attempt, error = %reason, "Upstream unavailable");
                    metrics::record_upstream_call(name, "unavailable");
                    return Err(UpstreamError::UpstreamUnavailable {
                        endpoint: name,
                        attempts: attempt,
                        reason,
                    });
                }
                Err(UpstreamError::Parse(reason)) => {
                    tracing::warn!(endpoint = name, path, error = %reason, "Upstream returned invalid JSON");
                    metrics::record_upstream_call(name, "malformed");
                    return Err(UpstreamError::malformed(name, reason));
                }
                Err(other) => {
                    metrics::record_upstream_call(name, other.kind());
                    return Err(other);
                }
            }
        }
    }
}

#[async_trait]
impl HistorySource for UpstreamClient {
    async fn fetch_range(
        &self,
        symbol: &str,
        series: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> UpstreamResult<ResultSet> {
        let body = self
            .fetch(
                Endpoint::EquityHistory,
                &endpoints::equity_history_path(symbol, series, from, to),
            )
            .await?;
        shapes::history_records(body)
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("epoch", &self.epoch.load(Ordering::Relaxed))
            .field("retry", &self.retry)
            .field("history_attempts", &self.history_attempts)
            .field("custom_history_source", &self.history_source.is_some())
            .finish()
    }
}
