//! Keys the upstream is known to accept.
//!
//! These lists are informational: they are served to callers so they know
//! what to ask for, but requests are never filtered against them. An unknown
//! key is forwarded and the upstream decides.

use serde::Serialize;

pub const PRE_MARKET_KEYS: &[&str] = &["NIFTY", "BANKNIFTY", "SME", "FO", "OTHERS", "ALL"];

pub const LIVE_MARKET_KEYS: &[&str] = &[
    "NIFTY 50",
    "NIFTY NEXT 50",
    "NIFTY MIDCAP 50",
    "NIFTY MIDCAP 100",
    "NIFTY MIDCAP 150",
    "NIFTY SMALLCAP 50",
    "NIFTY SMALLCAP 100",
    "NIFTY SMALLCAP 250",
    "NIFTY MIDSMALLCAP 400",
    "NIFTY 100",
    "NIFTY 200",
    "NIFTY500 MULTICAP 50:25:25",
    "NIFTY LARGEMIDCAP 250",
    "NIFTY AUTO",
    "NIFTY BANK",
    "NIFTY ENERGY",
    "NIFTY FINANCIAL SERVICES",
    "NIFTY FINANCIAL SERVICES 25/50",
    "NIFTY FMCG",
    "NIFTY IT",
    "NIFTY MEDIA",
    "NIFTY METAL",
    "NIFTY PHARMA",
    "NIFTY PSU BANK",
    "NIFTY REALTY",
    "NIFTY PRIVATE BANK",
    "NIFTY HEALTHCARE INDEX",
    "NIFTY CONSUMER DURABLES",
    "NIFTY OIL & GAS",
    "NIFTY COMMODITIES",
    "NIFTY INDIA CONSUMPTION",
    "NIFTY CPSE",
    "NIFTY INFRASTRUCTURE",
    "NIFTY MNC",
    "NIFTY GROWTH SECTORS 15",
    "NIFTY PSE",
    "NIFTY SERVICES SECTOR",
    "NIFTY100 LIQUID 15",
    "NIFTY MIDCAP LIQUID 15",
    "NIFTY DIVIDEND OPPORTUNITIES 50",
    "NIFTY50 VALUE 20",
    "NIFTY100 QUALITY 30",
    "NIFTY50 EQUAL WEIGHT",
    "NIFTY100 EQUAL WEIGHT",
    "NIFTY100 LOW VOLATILITY 30",
    "NIFTY ALPHA 50",
    "NIFTY200 QUALITY 30",
    "NIFTY ALPHA LOW-VOLATILITY 30",
    "NIFTY200 MOMENTUM 30",
    "Securities in F&O",
    "Permitted to Trade",
];

pub const HOLIDAY_KEYS: &[&str] = &["clearing", "trading"];

/// All key lists, as served by the keys endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SupportedKeys {
    pub pre_market: &'static [&'static str],
    pub live_market: &'static [&'static str],
    pub holiday: &'static [&'static str],
}

pub fn supported_keys() -> SupportedKeys {
    SupportedKeys {
        pre_market: PRE_MARKET_KEYS,
        live_market: LIVE_MARKET_KEYS,
        holiday: HOLIDAY_KEYS,
    }
}
