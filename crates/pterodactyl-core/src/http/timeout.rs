//! Timeout configuration for panel requests

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Timeout configuration for HTTP requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout - time to establish a connection
    pub connect_timeout: Duration,
    /// Request timeout - total time for one attempt
    pub request_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    /// Create a new timeout configuration
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    /// Override the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout cannot be zero".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        if self.connect_timeout > self.request_timeout {
            return Err("Connect timeout cannot exceed request timeout".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts_are_valid() {
        let config = TimeoutConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_validation() {
        assert!(TimeoutConfig::new(Duration::ZERO, Duration::from_secs(1)).validate().is_err());
        assert!(TimeoutConfig::new(Duration::from_secs(1), Duration::ZERO).validate().is_err());
        assert!(TimeoutConfig::new(Duration::from_secs(5), Duration::from_secs(1)).validate().is_err());
    }

    #[test]
    fn test_request_timeout_override() {
        let config = TimeoutConfig::default().with_request_timeout(Duration::from_secs(120));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
