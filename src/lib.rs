//! NSE market-data proxy library.
//!
//! Serves NSE pre-open, live index, holiday, option-chain and equity-history
//! data as flat JSON records, fetched through a cookie-bearing upstream
//! session that is re-established once when the upstream stops honouring it.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::{UpstreamClient, UpstreamError};
