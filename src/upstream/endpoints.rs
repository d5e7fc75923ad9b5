//! Upstream endpoint identities and path construction.
//!
//! Keys are forwarded without checking them against the supported lists in
//! [`crate::upstream::keys`]; they are only query-encoded.

use chrono::NaiveDate;
use url::form_urlencoded;

/// Date format used by the upstream history API.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// The upstream endpoints the client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    PreMarket,
    LiveMarket,
    Holiday,
    OptionChain,
    EquityHistory,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::PreMarket => "pre_market",
            Endpoint::LiveMarket => "live_market",
            Endpoint::Holiday => "holiday",
            Endpoint::OptionChain => "option_chain",
            Endpoint::EquityHistory => "equity_history",
        }
    }
}

/// Percent-encode a query value, spaces as `%20`.
pub fn encode_query_value(value: &str) -> String {
    // byte_serialize turns a literal '+' into %2B, so any '+' left is a space.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn pre_market_path(key: &str) -> String {
    format!("/api/market-data-pre-open?key={}", encode_query_value(key))
}

/// Index names are upper-cased before encoding ("nifty 50" -> "NIFTY%2050").
pub fn live_market_path(index: &str) -> String {
    format!(
        "/api/equity-stockIndices?index={}",
        encode_query_value(&index.to_uppercase())
    )
}

pub fn holiday_path(calendar_type: &str) -> String {
    format!("/api/holiday-master?type={}", encode_query_value(calendar_type))
}

pub fn option_chain_path(symbol: &str, is_index: bool) -> String {
    let segment = if is_index {
        "option-chain-indices"
    } else {
        "option-chain-equities"
    };
    format!("/api/{}?symbol={}", segment, encode_query_value(symbol))
}

pub fn equity_history_path(symbol: &str, series: &str, from: NaiveDate, to: NaiveDate) -> String {
    let series = format!("[\"{}\"]", series);
    format!(
        "/api/historical/cm/equity?symbol={}&series={}&from={}&to={}",
        encode_query_value(symbol),
        encode_query_value(&series),
        from.format(DATE_FORMAT),
        to.format(DATE_FORMAT),
    )
}
