//! Output formatting and writing utilities
//!
//! Renders panel responses as JSON, YAML or human-readable text, with
//! tables for list results and spinners for long-running page walks.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::time::Duration;
use tracing::trace;

/// Columns tried, in order, when tabulating list items
const PREFERRED_COLUMNS: &[&str] = &[
    "identifier", "id", "uuid", "name", "username", "email", "description", "status",
];

/// Most columns shown in a human table
const MAX_COLUMNS: usize = 4;

/// Formatting of serializable values per output format
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a panel response body
    fn format_response(&self, value: &Value) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_response(&self, value: &Value) -> Result<String> {
        match (self, value) {
            (OutputFormat::Human, Value::Null) => Ok("(no content)".to_string()),
            (OutputFormat::Human, Value::String(text)) => Ok(text.clone()),
            _ => self.format(value),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Disable spinners regardless of the terminal
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a panel response body
    pub fn response(&mut self, value: &Value) -> Result<()> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut redacted = value.clone();
            redaction::redact_json_value(&mut redacted);
            trace!(body = %redacted, "Writing response");
        }

        let formatted = self.format.format_response(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write list items: a table for humans, an array otherwise
    pub fn items(&mut self, items: &[Value]) -> Result<()> {
        if !self.is_human() {
            return self.data(&items);
        }

        if items.is_empty() {
            return self.info("No items returned");
        }

        let columns = table_columns(items);
        if columns.is_empty() {
            return self.data(&items);
        }

        let rows: Vec<Vec<String>> = items
            .iter()
            .map(|item| {
                columns
                    .iter()
                    .map(|column| attributes(item).get(*column).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        self.table(&columns, rows)?;
        self.info(&format!("{} item(s)", items.len()))
    }

    /// Write a table (human format only)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");
        let header_row = header_row.trim_end();

        if self.use_color {
            self.writeln(&header_row.bold().to_string())?;
        } else {
            self.writeln(header_row)?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => format!("{:width$}", cell, width = width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Panel list items wrap their fields in `attributes`
fn attributes(item: &Value) -> &Value {
    item.get("attributes").unwrap_or(item)
}

/// Preferred scalar columns present in the first item
fn table_columns(items: &[Value]) -> Vec<&'static str> {
    let Some(first) = items.first().map(attributes) else {
        return Vec::new();
    };

    PREFERRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| first.get(*column).is_some_and(|v| !v.is_object() && !v.is_array()))
        .take(MAX_COLUMNS)
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn writer(format: OutputFormat) -> (OutputWriter, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let writer = OutputWriter::with_writer(format, false, false, Box::new(buffer.clone()));
        (writer, buffer)
    }

    fn servers() -> Vec<Value> {
        vec![
            json!({"object": "server", "attributes": {"identifier": "abc123", "name": "Lobby", "limits": {"memory": 1024}}}),
            json!({"object": "server", "attributes": {"identifier": "def456", "name": "Survival", "limits": {"memory": 4096}}}),
        ]
    }

    #[test]
    fn test_items_human_table() {
        let (mut out, buffer) = writer(OutputFormat::Human);
        out.items(&servers()).unwrap();

        let text = buffer.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "identifier │ name");
        assert!(lines[2].starts_with("abc123     │ Lobby"));
        assert!(lines[3].starts_with("def456     │ Survival"));
        assert!(text.contains("INFO: 2 item(s)"));
        assert!(!text.contains("limits"));
    }

    #[test]
    fn test_items_json_is_array() {
        let (mut out, buffer) = writer(OutputFormat::Json);
        out.items(&servers()).unwrap();

        let parsed: Value = serde_json::from_str(buffer.contents().trim()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[1]["attributes"]["name"], "Survival");
    }

    #[test]
    fn test_response_formats() {
        assert_eq!(
            OutputFormat::Human.format_response(&Value::Null).unwrap(),
            "(no content)"
        );
        assert_eq!(
            OutputFormat::Human.format_response(&json!("raw file body")).unwrap(),
            "raw file body"
        );
        assert_eq!(OutputFormat::Json.format_response(&json!({"a": 1})).unwrap(), r#"{"a":1}"#);
        assert_eq!(OutputFormat::Yaml.format_response(&json!({"a": 1})).unwrap(), "a: 1\n");
    }

    #[test]
    fn test_messages_suppressed_for_machine_formats() {
        let (mut out, buffer) = writer(OutputFormat::Json);
        out.info("hello").unwrap();
        out.success("done").unwrap();
        out.section("Profiles").unwrap();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_quiet_suppresses_info_but_not_warnings() {
        let buffer = SharedBuffer::default();
        let mut out = OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(buffer.clone()));
        out.info("hidden").unwrap();
        out.warning("shown").unwrap();
        assert_eq!(buffer.contents(), "WARNING: shown\n");
    }

    #[test]
    fn test_spinner_disabled_for_custom_writer() {
        let (out, _) = writer(OutputFormat::Human);
        assert!(out.spinner("Fetching").is_none());
    }
}
