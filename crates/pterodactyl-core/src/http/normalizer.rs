//! Error normalization for panel responses
//!
//! The panel reports failures as `{"errors": [{"code", "status", "detail"}]}`.
//! This module turns that envelope, or a bare status code, into one
//! [`Error`] whose message says what to do about it.

use serde_json::Value;

use crate::error::{Error, ErrorCause, ErrorKind};

/// Prefix used for messages taken from the panel's error envelope
pub const ERROR_NAMESPACE: &str = "Pterodactyl API";

/// Actionable hint for a status code
pub fn status_hint(status: u16) -> Option<&'static str> {
    match status {
        401 => Some("API key invalid/expired."),
        403 => Some("Insufficient permissions, server suspended, or API key lacks access."),
        404 => Some("Resource not found. Check server ID/identifier or endpoint URL."),
        409 => Some("Server suspended, power action in progress, or would exceed disk limits."),
        422 => Some("Validation error. Check input parameters."),
        429 => Some("Rate limit exceeded. Enable retry-on-fail with bounded attempts and wait."),
        500 => Some("Upstream panel error. Check panel logs."),
        502 => Some("Backing daemon down/unreachable."),
        _ => None,
    }
}

/// Message taken from the body: the first envelope entry, else a top-level
/// `message` string
fn body_message(body: Option<&Value>) -> Option<String> {
    let body = body?;

    if let Some(first) = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let code = scalar_text(first.get("code")).unwrap_or_else(|| "UnknownError".to_string());
        let detail = scalar_text(first.get("detail")).unwrap_or_else(|| "No detail provided".to_string());
        return Some(format!("{} Error [{}]: {}", ERROR_NAMESPACE, code, detail));
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// Text of a string or number field; the panel is not consistent about which
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Compose the final message from an optional base and a status code
fn compose_message(base: Option<String>, status: Option<u16>) -> String {
    let base = match (base, status) {
        (Some(base), _) => Some(base),
        (None, Some(code)) => Some(format!("HTTP {} error", code)),
        (None, None) => None,
    };

    let hint = status.and_then(status_hint);

    match (base, hint) {
        (Some(base), Some(hint)) => format!("{} - {}", base, hint),
        (Some(base), None) => base,
        (None, Some(hint)) => hint.to_string(),
        (None, None) => "Pterodactyl request failed".to_string(),
    }
}

fn kind_for_status(status: u16) -> ErrorKind {
    if status == 429 {
        ErrorKind::RateLimited
    } else {
        ErrorKind::Remote
    }
}

/// Normalize a non-2xx response
pub fn normalize_response_error(status: u16, body: Option<&Value>) -> Error {
    let message = compose_message(body_message(body), Some(status));
    Error::new(kind_for_status(status), message).with_status(status)
}

/// Normalize a failure that may or may not carry a status and a cause
pub fn normalize_error(status: Option<u16>, body: Option<&Value>, cause: Option<ErrorCause>) -> Error {
    let base = body_message(body).or_else(|| cause.as_ref().map(|c| c.message.clone()));
    let message = compose_message(base, status);

    let kind = status.map(kind_for_status).unwrap_or(ErrorKind::Transport);
    let mut error = Error::new(kind, message);
    error.status_code = status;
    error.cause = cause;
    error
}

/// Normalize a `reqwest` transport exception
pub fn normalize_transport_error(error: &reqwest::Error) -> Error {
    let name = if error.is_timeout() {
        "TimeoutError"
    } else if error.is_connect() {
        "ConnectError"
    } else if error.is_body() || error.is_decode() {
        "BodyError"
    } else if error.is_builder() {
        "BuilderError"
    } else {
        "RequestError"
    };

    let status = error.status().map(|s| s.as_u16());
    normalize_error(status, None, Some(ErrorCause::capture(name, error)))
}
