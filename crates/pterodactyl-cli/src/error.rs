//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use pterodactyl_core::ErrorKind;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the panel transport
    #[error("{0}")]
    Panel(#[from] pterodactyl_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination or value
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Profile not found
    #[error("Profile '{}' not found", name)]
    ProfileNotFound { name: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Panel(e) => match e.kind {
                ErrorKind::Configuration => 5,
                ErrorKind::RateLimited | ErrorKind::RetriesExhausted => 7,
                ErrorKind::Transport => 10,
                ErrorKind::Remote | ErrorKind::Decode => 2,
            },
            Self::FileNotFound { .. } => 3,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::ProfileNotFound { .. } => 8,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::TomlDe(_) | Self::TomlSer(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    if let Error::Panel(panel_error) = error {
        if let Some(status) = panel_error.status_code {
            message.push_str(&format!("\n  status: {}", status));
        }
        if let Some(cause) = &panel_error.cause {
            message.push_str(&format!("\n  cause: {}: {}", cause.name, cause.message));
            for source in &cause.chain {
                message.push_str(&format!("\n    caused by: {}", source));
            }
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use pterodactyl_core::ErrorCause;

    #[test]
    fn test_exit_codes_follow_panel_error_kind() {
        let rate_limited = Error::from(
            pterodactyl_core::Error::new(ErrorKind::RetriesExhausted, "max retries exceeded").with_status(429),
        );
        assert_eq!(rate_limited.exit_code(), 7);

        let config = Error::from(pterodactyl_core::Error::configuration("Panel URL is not configured."));
        assert_eq!(config.exit_code(), 5);

        assert_eq!(Error::invalid_args("bad").exit_code(), 6);
        assert!(Error::invalid_args("bad").should_show_help());
    }

    #[test]
    fn test_format_panel_error_with_cause() {
        let panel_error = pterodactyl_core::Error::new(ErrorKind::Transport, "error sending request")
            .with_cause(ErrorCause {
                name: "ConnectError".to_string(),
                message: "error sending request".to_string(),
                chain: vec!["connection refused".to_string()],
            });

        let formatted = format_error(&Error::from(panel_error), false);
        assert!(formatted.starts_with("Error: error sending request"));
        assert!(formatted.contains("cause: ConnectError: error sending request"));
        assert!(formatted.contains("caused by: connection refused"));
    }

    #[test]
    fn test_format_plain_error() {
        let formatted = format_error(&Error::config("no profiles"), false);
        assert_eq!(formatted, "Error: Configuration error: no profiles");
    }
}
