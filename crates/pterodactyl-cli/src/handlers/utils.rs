//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use pterodactyl_core::{Method, PanelClient, RequestOptions};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Build a panel client over every configured profile
pub fn build_client(config: &Config) -> Result<PanelClient> {
    let resolver = config.credential_resolver();
    Ok(PanelClient::new(config.client_config(), Arc::new(resolver))?)
}

/// Parse an HTTP method name, case-insensitively
pub fn parse_method(method: &str) -> Result<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(Error::invalid_args(format!(
            "Unsupported HTTP method '{}'. Use GET, POST, PUT, PATCH or DELETE",
            other
        ))),
    }
}

/// Split `key=value`
pub fn parse_key_value(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(Error::invalid_args(format!("Expected KEY=VALUE, got '{}'", pair))),
    }
}

/// Query object from repeated `--query key=value` flags
pub fn parse_query(pairs: &[String]) -> Result<Option<Map<String, Value>>> {
    if pairs.is_empty() {
        return Ok(None);
    }

    let mut query = Map::new();
    for pair in pairs {
        let (key, value) = parse_key_value(pair)?;
        query.insert(key, Value::String(value));
    }
    Ok(Some(query))
}

/// Header overrides and timeout for one request
pub fn request_options(headers: &[String], timeout_secs: Option<u64>) -> Result<RequestOptions> {
    let mut options = RequestOptions::new();
    for header in headers {
        let (name, value) = parse_key_value(header)?;
        options = options.with_header(name, value);
    }

    match timeout_secs {
        Some(0) => Err(Error::invalid_args("--timeout must be at least 1 second")),
        Some(secs) => Ok(options.with_timeout(Duration::from_secs(secs))),
        None => Ok(options),
    }
}

/// Request body from inline JSON or `@path`
pub fn read_body(body: Option<&str>) -> Result<Option<Value>> {
    let Some(body) = body else {
        return Ok(None);
    };

    let content = match body.strip_prefix('@') {
        Some(path) => {
            let path = Path::new(path);
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            std::fs::read_to_string(path)?
        }
        None => body.to_string(),
    };

    let value = serde_json::from_str(&content)
        .map_err(|e| Error::invalid_args(format!("Request body is not valid JSON: {}", e)))?;
    Ok(Some(value))
}
