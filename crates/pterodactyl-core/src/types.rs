//! Core data types shared by the transport components

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base path of the Client API
pub const CLIENT_API_BASE: &str = "/api/client";

/// Base path of the Application API
pub const APPLICATION_API_BASE: &str = "/api/application";

/// Versioned vendor media type sent in `Accept`
pub const PTERODACTYL_ACCEPT: &str = "application/vnd.pterodactyl.v1+json";

/// Which Pterodactyl sub-API a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKind {
    /// Client API, authenticated with a user account key
    Client,
    /// Application API, authenticated with an admin application key
    Application,
}

impl ApiKind {
    /// Path prefix placed between the panel URL and the endpoint
    pub fn api_base(&self) -> &'static str {
        match self {
            ApiKind::Client => CLIENT_API_BASE,
            ApiKind::Application => APPLICATION_API_BASE,
        }
    }

    /// Documented per-key request quota per minute
    pub fn default_budget(&self) -> u32 {
        match self {
            ApiKind::Client => 720,
            ApiKind::Application => 240,
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKind::Client => write!(f, "client"),
            ApiKind::Application => write!(f, "application"),
        }
    }
}

/// Resolved panel URL and API key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub base_url: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Panel URL without trailing slashes
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    /// API key as sent in the `Authorization` header
    pub fn normalized_api_key(&self) -> &str {
        self.api_key.trim()
    }

    /// Rate-limiter key for this credential
    pub fn identity(&self) -> CredentialId {
        CredentialId {
            base_url: self.normalized_base_url().to_string(),
            api_key: self.normalized_api_key().to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

/// Identity of one (panel URL, API key) pair.
///
/// Both parts are the values actually sent to the panel, so two credentials
/// share a budget exactly when the panel would see the same key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialId {
    base_url: String,
    api_key: String,
}

impl CredentialId {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId({}, ***)", self.base_url)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

/// Per-call transport options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Extra headers; these replace the defaults on a name clash
    pub headers: HashMap<String, String>,
    /// Overrides the client-wide request timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One logical request as built by an operation handler
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub api_kind: ApiKind,
    pub endpoint: String,
    pub body: Option<Value>,
    pub query: Option<Map<String, Value>>,
    pub options: RequestOptions,
}

impl RequestDescriptor {
    pub fn new(method: Method, api_kind: ApiKind, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            api_kind,
            endpoint: endpoint.into(),
            body: None,
            query: None,
            options: RequestOptions::default(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Copy of this descriptor with `page` set in the query
    pub fn for_page(&self, page: u32) -> Self {
        let mut query = self.query.clone().unwrap_or_default();
        query.insert("page".to_string(), Value::from(page));

        Self {
            query: Some(query),
            ..self.clone()
        }
    }
}
