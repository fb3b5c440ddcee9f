//! Logging setup for the pterodactyl CLI
//!
//! This module provides:
//! - Session request ID generation
//! - Redaction of panel API keys and bearer tokens
//! - Operation timing spans
//! - Subscriber setup in compact, full or JSON format, to stderr or a file

use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Optional file output path
    pub file: Option<PathBuf>,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact format for everyday use
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "full" => Some(LogFormat::Full),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => config.level = "warn".to_string(),
            1 => config.level = "info".to_string(),
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        // RUST_LOG takes precedence
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("PTERODACTYL_LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(format) => self.format = format,
                None => eprintln!("Warning: invalid PTERODACTYL_LOG_FORMAT '{}', using default", format),
            }
        }

        if let Ok(file) = std::env::var("PTERODACTYL_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
    }
}

/// Initialize the global logging system.
///
/// The returned guard flushes file output on drop and must outlive the run.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::other(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let (writer, guard, ansi) = match &config.file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard), false)
        }
        None => (
            BoxMakeWriter::new(std::io::stderr),
            None,
            config.console && std::io::stderr().is_terminal(),
        ),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish()),
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish()),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = REQUEST_ID.get_or_init(generate_request_id);
    tracing::debug!(
        request_id = %request_id,
        level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(guard)
}

fn file_writer(path: &Path) -> Result<(BoxMakeWriter, WorkerGuard)> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::config(format!("Log file path has no file name: {}", path.display())))?;

    std::fs::create_dir_all(&directory)?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(non_blocking), guard))
}

/// Generate a unique request ID for this session
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Get the current request ID
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

/// Create a span with request ID and timing
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Redaction of panel credentials in displayed values
pub mod redaction {
    use regex::Regex;
    use serde_json::Value;
    use std::sync::OnceLock;

    static PANEL_KEY_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    static BEARER_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    fn panel_key_regex() -> Option<&'static Regex> {
        PANEL_KEY_REGEX
            .get_or_init(|| Regex::new(r"\bptl[acr]_[A-Za-z0-9]{4,}").ok())
            .as_ref()
    }

    fn bearer_regex() -> Option<&'static Regex> {
        BEARER_REGEX
            .get_or_init(|| Regex::new(r"(?i)\b(bearer)\s+[A-Za-z0-9_.\-]{8,}").ok())
            .as_ref()
    }

    /// Redact panel API keys and bearer tokens from a string
    pub fn redact_sensitive(input: &str) -> String {
        let mut result = input.to_string();

        if let Some(regex) = panel_key_regex() {
            result = regex.replace_all(&result, "***").to_string();
        }
        if let Some(regex) = bearer_regex() {
            result = regex.replace_all(&result, "$1 ***").to_string();
        }

        result
    }

    /// Mask a key, keeping its `ptlc_`/`ptla_` prefix visible
    pub fn mask_key(key: &str) -> String {
        match key.split_once('_') {
            Some((prefix, _)) if prefix.len() <= 4 => format!("{}_***", prefix),
            _ if key.is_empty() => String::new(),
            _ => "***".to_string(),
        }
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) && val.is_string() {
                        *val = Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            Value::Array(arr) => arr.iter_mut().for_each(redact_json_value),
            Value::String(s) => *s = redact_sensitive(s),
            _ => {}
        }
    }

    fn is_sensitive_key(key: &str) -> bool {
        let key = key.to_lowercase();
        ["api_key", "apikey", "token", "password", "secret", "authorization"]
            .iter()
            .any(|needle| key.contains(needle))
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that logs its duration when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }

        /// Get elapsed time without finishing the timer
        pub fn elapsed(&self) -> std::time::Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_key_redaction() {
        let input = "auth failed for ptlc_AbCdEf1234567890 and ptla_ZyXw98765432";
        let redacted = redaction::redact_sensitive(input);
        assert_eq!(redacted, "auth failed for *** and ***");
    }

    #[test]
    fn test_bearer_redaction() {
        let redacted = redaction::redact_sensitive("Authorization: Bearer abcdefgh12345678");
        assert_eq!(redacted, "Authorization: Bearer ***");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(redaction::mask_key("ptlc_AbCdEf1234567890"), "ptlc_***");
        assert_eq!(redaction::mask_key("plainsecret"), "***");
        assert_eq!(redaction::mask_key(""), "");
    }

    #[test]
    fn test_json_redaction() {
        let mut value = serde_json::json!({
            "client_api_key": "ptlc_1234567890abcdef",
            "panel_url": "https://panel.example.com",
            "headers": {"Authorization": "Bearer token1234567"},
            "notes": ["uses ptla_secretsecret"]
        });

        redaction::redact_json_value(&mut value);

        assert_eq!(value["client_api_key"], "***");
        assert_eq!(value["panel_url"], "https://panel.example.com");
        assert_eq!(value["headers"]["Authorization"], "***");
        assert_eq!(value["notes"][0], "uses ***");
    }

    #[test]
    fn test_logging_config_from_verbosity() {
        let config = LoggingConfig::from_verbosity(0);
        assert_eq!(config.level, "warn");
        assert!(!config.source_location);

        let config = LoggingConfig::from_verbosity(2);
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = LoggingConfig::from_verbosity(3);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.thread_ids);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
