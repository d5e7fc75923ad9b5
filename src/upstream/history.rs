//! Equity history lookup with backward date search.
//!
//! Given a target date, ask the history source for the one-day window ending
//! on it. An empty answer means the market was closed (weekend, holiday), so
//! the window slides back a day and the source is asked again, up to a
//! bounded number of attempts. Running out of attempts is not an error.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::upstream::error::UpstreamResult;
use crate::upstream::record::ResultSet;

/// Date-ranged equity history by symbol and series.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Records for `symbol`/`series` between `from` and `to`, inclusive.
    async fn fetch_range(
        &self,
        symbol: &str,
        series: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> UpstreamResult<ResultSet>;
}

/// Symbol, series and the date to search back from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub symbol: String,
    pub series: String,
    pub date: NaiveDate,
}

impl HistoryQuery {
    /// Symbol and series are upper-cased, as the upstream expects.
    pub fn new(symbol: &str, series: &str, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            series: series.to_uppercase(),
            date,
        }
    }
}

/// Outcome of a backward search.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLookup {
    /// Records of the first window that had data; empty if none did.
    pub records: ResultSet,
    /// Number of source calls made.
    pub attempts: u32,
    /// End date of the window that produced `records`.
    pub found_on: Option<NaiveDate>,
}

/// Walk back from `query.date` until the source returns data.
///
/// Attempt `n` (starting at 0) covers `[date - n - 1, date - n]`. Source
/// errors end the search immediately.
pub async fn previous_session(
    source: &dyn HistorySource,
    query: &HistoryQuery,
    max_attempts: u32,
) -> UpstreamResult<HistoryLookup> {
    let max_attempts = max_attempts.max(1);
    let mut end = query.date;
    let mut attempts = 0;

    loop {
        let Some(start) = end.pred_opt() else {
            break;
        };

        attempts += 1;
        let records = source
            .fetch_range(&query.symbol, &query.series, start, end)
            .await?;

        if !records.is_empty() {
            return Ok(HistoryLookup {
                records,
                attempts,
                found_on: Some(end),
            });
        }

        if attempts >= max_attempts {
            break;
        }

        tracing::debug!(
            symbol = %query.symbol,
            series = %query.series,
            date = %end,
            attempt = attempts,
            "No trading data, stepping back one day"
        );
        end = start;
    }

    Ok(HistoryLookup {
        records: Vec::new(),
        attempts,
        found_on: None,
    })
}
