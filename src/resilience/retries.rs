//! Session retry policy.
//!
//! A transport failure may mean the upstream stopped honouring our cookies,
//! so the remedy is a new session followed by a single retry. Nothing else is
//! retried: a body that failed to parse or had the wrong shape was delivered
//! fine, and asking again will not change it.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;
use crate::upstream::UpstreamError;

/// Attempts per upstream call: the initial one plus one retry.
pub const SESSION_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            base_delay_ms: config.backoff_base_ms,
            max_delay_ms: config.backoff_max_ms,
        }
    }

    /// Policy without any delay before the retry.
    pub fn immediate() -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Whether `attempt` (1-based) may be followed by a reset and a retry.
    pub fn should_retry(&self, attempt: u32, error: &UpstreamError) -> bool {
        attempt < SESSION_ATTEMPTS && matches!(error, UpstreamError::Transport(_))
    }

    /// Delay to wait after `attempt` failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_transport_failure_is_retried() {
        let policy = RetryPolicy::immediate();
        let transport = UpstreamError::Transport("reset by peer".into());

        assert!(policy.should_retry(1, &transport));
        assert!(!policy.should_retry(2, &transport));
        assert!(!policy.should_retry(1, &UpstreamError::Parse("eof".into())));
        assert!(!policy.should_retry(1, &UpstreamError::malformed("holiday", "x")));
    }

    #[test]
    fn test_delay_follows_config() {
        let policy = RetryPolicy::new(&RetryConfig {
            backoff_base_ms: 50,
            backoff_max_ms: 60,
        });
        let delay = policy.delay(1);
        assert!(delay >= Duration::from_millis(50) && delay < Duration::from_millis(55));
        assert_eq!(RetryPolicy::immediate().delay(1), Duration::ZERO);
    }
}
