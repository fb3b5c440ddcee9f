//! Error types for the Pterodactyl transport
//!
//! Every failure the transport produces is reduced to a single [`Error`]
//! value: a human-readable message, the HTTP status code when one exists, and
//! an [`ErrorKind`] that callers (and the retry loop) can match on.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed credentials/configuration - never retried
    Configuration,
    /// Upstream answered 429
    RateLimited,
    /// 429 persisted after every retry was spent
    RetriesExhausted,
    /// Any other non-2xx answer from the panel
    Remote,
    /// Connection failures, timeouts and other transport exceptions
    Transport,
    /// The response could not be read
    Decode,
}

impl ErrorKind {
    /// Whether the retry loop may try again after this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::RateLimited => write!(f, "rate_limited"),
            ErrorKind::RetriesExhausted => write!(f, "retries_exhausted"),
            ErrorKind::Remote => write!(f, "remote"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Plain-data copy of an underlying error.
///
/// Holds strings only so a normalized error never references the error it
/// was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCause {
    /// Short category name of the original error (e.g. `TimeoutError`)
    pub name: String,
    /// Display text of the original error
    pub message: String,
    /// Display text of each `source()` below the original error, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<String>,
}

impl ErrorCause {
    /// Flatten an error and its source chain into plain strings
    pub fn capture(name: impl Into<String>, error: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            chain.push(source.to_string());
            current = source.source();
        }

        Self {
            name: name.into(),
            message: error.to_string(),
            chain,
        }
    }
}

/// Normalized transport error
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct Error {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-actionable message, never empty
    pub message: String,
    /// HTTP status code if the panel answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Flattened underlying error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<ErrorCause>,
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            format!("Pterodactyl request failed ({})", kind)
        } else {
            message
        };

        Self {
            kind,
            message,
            status_code: None,
            cause: None,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Attach a status code
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Attach a flattened cause
    pub fn with_cause(mut self, cause: ErrorCause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Whether the retry loop may try again
    pub fn should_retry(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn test_empty_message_gets_fallback() {
        let err = Error::new(ErrorKind::Remote, "  ");
        assert!(!err.message.is_empty());
        assert!(err.message.contains("remote"));
    }

    #[test]
    fn test_only_rate_limited_is_retryable() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::RetriesExhausted.is_retryable());
        assert!(!ErrorKind::Remote.is_retryable());
        assert!(!ErrorKind::Transport.is_retryable());
        assert!(!ErrorKind::Configuration.is_retryable());
    }

    #[test]
    fn test_cause_flattens_source_chain() {
        let outer = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        let cause = ErrorCause::capture("ConnectError", &outer);

        assert_eq!(cause.name, "ConnectError");
        assert_eq!(cause.message, "outer failure");
        assert_eq!(cause.chain, vec!["refused".to_string()]);
    }

    #[test]
    fn test_display_is_message() {
        let err = Error::configuration("Panel URL is not configured.").with_status(400);
        assert_eq!(err.to_string(), "Panel URL is not configured.");
        assert_eq!(err.status_code, Some(400));
    }
}
