//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → session timeouts (connect + request, set on the HTTP client)
//!     → On transport failure: retries.rs (one session reset, one retry)
//!     → backoff.rs (jittered delay before the retry)
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - Exactly one retry, and only for transport failures
//! - Parse and shape errors are never retried

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{RetryPolicy, SESSION_ATTEMPTS};
