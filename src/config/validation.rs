//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: addresses parse, upstream
//! URLs are http(s), timeouts and attempt bounds are non-zero, and CORS
//! origins are usable header values. Every problem is reported, not just the
//! first one.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid http(s) URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field}: not a valid header value")]
    InvalidHeader { field: &'static str },

    #[error("cors.allowed_origins: invalid origin '{0}'")]
    InvalidOrigin(String),

    #[error("retries.backoff_base_ms ({base}) exceeds retries.backoff_max_ms ({max})")]
    BackoffRange { base: u64, max: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_url(&mut errors, "upstream.base_url", &config.upstream.base_url);
    check_url(&mut errors, "upstream.warmup_url", &config.upstream.warmup_url);

    check_header(&mut errors, "upstream.user_agent", &config.upstream.user_agent);
    check_header(&mut errors, "upstream.accept_language", &config.upstream.accept_language);

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs" });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if config.retries.backoff_base_ms > config.retries.backoff_max_ms {
        errors.push(ValidationError::BackoffRange {
            base: config.retries.backoff_base_ms,
            max: config.retries.backoff_max_ms,
        });
    }

    if config.history.max_attempts == 0 {
        errors.push(ValidationError::Zero { field: "history.max_attempts" });
    }

    for origin in &config.cors.allowed_origins {
        if HeaderValue::from_str(origin).is_err() || Url::parse(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_header(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Empty { field });
    } else if HeaderValue::from_str(value).is_err() {
        errors.push(ValidationError::InvalidHeader { field });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.base_url = "ftp://example.com".into();
        config.timeouts.upstream_secs = 0;
        config.history.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero { field: "history.max_attempts" }));
        assert!(errors.iter().any(|e| e.to_string().contains("upstream.base_url")));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_origin_and_backoff_range() {
        let mut config = ProxyConfig::default();
        config.cors.allowed_origins = vec!["http://localhost:5173".into(), "nope".into()];
        config.retries.backoff_base_ms = 5000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BackoffRange { base: 5000, max: 2000 },
                ValidationError::InvalidOrigin("nope".into()),
            ]
        );
    }
}
