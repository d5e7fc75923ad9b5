//! Upstream market-data subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → client.rs (operation, retry on transport failure)
//!     → session.rs (cookie session, JSON fetch)
//!     → shapes.rs (validate & flatten payload)
//!     → record.rs (column-aligned ResultSet)
//! ```
//!
//! Equity history additionally goes through history.rs, which walks back one
//! day at a time until a trading day is found.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod history;
pub mod keys;
pub mod record;
pub mod session;
pub mod shapes;

pub use client::{LiveMarket, UpstreamClient};
pub use error::{UpstreamError, UpstreamResult};
pub use history::{previous_session, HistoryLookup, HistoryQuery, HistorySource};
pub use record::{Record, ResultSet};
pub use session::{HttpSession, SessionSettings, SessionTransport};
