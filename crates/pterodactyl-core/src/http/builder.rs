//! HTTP request builder for panel API calls
//!
//! Turns a [`RequestDescriptor`] plus resolved [`Credentials`] into a
//! `reqwest::Request`: final URL, auth and media-type headers, query string
//! and JSON body.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde_json::{Map, Value};

use crate::types::{Credentials, RequestDescriptor, PTERODACTYL_ACCEPT};
use crate::{Error, Result};

/// Builder for constructing panel requests
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
}

impl RequestBuilder {
    /// Create a builder that produces requests for `client`
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the request for one attempt
    pub fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        credentials: &Credentials,
    ) -> Result<reqwest::Request> {
        let url = build_url(credentials, descriptor)?;
        let headers = build_headers(credentials, descriptor)?;

        let mut request_builder = self
            .client
            .request(descriptor.method.clone(), url)
            .headers(headers);

        if let Some(body) = &descriptor.body {
            request_builder = request_builder.json(body);
        }

        if let Some(timeout) = descriptor.options.timeout {
            request_builder = request_builder.timeout(timeout);
        }

        request_builder.build().map_err(|e| {
            Error::configuration(format!("Failed to build request: {}", e))
        })
    }
}

/// Join panel URL, API base and endpoint into the string form of the URL
pub fn join_url(base_url: &str, api_base: &str, endpoint: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if endpoint.is_empty() || endpoint.starts_with('/') {
        format!("{}{}{}", base, api_base, endpoint)
    } else {
        format!("{}{}/{}", base, api_base, endpoint)
    }
}

/// Construct the full request URL, including the query string
pub fn build_url(credentials: &Credentials, descriptor: &RequestDescriptor) -> Result<Url> {
    let raw = join_url(
        &credentials.base_url,
        descriptor.api_kind.api_base(),
        &descriptor.endpoint,
    );

    let mut url = Url::parse(&raw).map_err(|e| {
        Error::configuration(format!("Invalid panel URL '{}': {}", raw, e))
    })?;

    if let Some(query) = &descriptor.query {
        let pairs = flatten_query(query);
        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in &pairs {
                serializer.append_pair(key, value);
            }
        }
    }

    Ok(url)
}

/// Default headers merged with the caller's overrides
pub fn build_headers(credentials: &Credentials, descriptor: &RequestDescriptor) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.normalized_api_key()))
        .map_err(|_| Error::configuration("API Key contains characters not allowed in a header"))?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(ACCEPT, HeaderValue::from_static(PTERODACTYL_ACCEPT));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in &descriptor.options.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            Error::configuration(format!("Invalid header name '{}'", name))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            Error::configuration(format!("Invalid value for header '{}'", name))
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Flatten a JSON query object into key/value pairs.
///
/// Arrays become comma lists (`include=allocations,user`), nested objects
/// become bracketed keys (`filter[name]=web`), nulls are skipped.
pub fn flatten_query(query: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        flatten_value(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten_value(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((key, joined));
        }
        Value::Object(map) => {
            for (sub_key, sub_value) in map {
                flatten_value(format!("{}[{}]", key, sub_key), sub_value, pairs);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
