//! Upstream error taxonomy.

use thiserror::Error;

/// Errors produced while talking to the upstream site.
///
/// `Transport` and `Parse` come out of the session layer. Client operations
/// never return them directly: a transport failure is retried once and then
/// becomes `UpstreamUnavailable`, a parse failure becomes `MalformedResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Network failure or a non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body is not valid JSON.
    #[error("invalid JSON body: {0}")]
    Parse(String),

    /// Valid JSON that does not match the endpoint's expected shape.
    #[error("malformed {endpoint} response: {reason}")]
    MalformedResponse { endpoint: &'static str, reason: String },

    /// Both the initial attempt and the retry failed at the transport level.
    #[error("{endpoint} unavailable after {attempts} attempts: {reason}")]
    UpstreamUnavailable {
        endpoint: &'static str,
        attempts: u32,
        reason: String,
    },

    /// The HTTP transport could not be constructed.
    #[error("failed to build upstream session: {0}")]
    Session(String),
}

impl UpstreamError {
    pub(crate) fn malformed(endpoint: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint,
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Parse(_) => "parse",
            Self::MalformedResponse { .. } => "malformed",
            Self::UpstreamUnavailable { .. } => "unavailable",
            Self::Session(_) => "session",
        }
    }
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
