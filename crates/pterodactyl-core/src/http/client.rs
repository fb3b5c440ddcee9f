//! Panel client orchestrating all transport components
//!
//! Provides the two calls operation handlers use: [`PanelClient::request`]
//! for a single authenticated, rate-limited, retried request, and
//! [`PanelClient::request_all_items`] for list endpoints.

use std::fmt;
use std::sync::Arc;

use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::credentials::{validate_credentials, CredentialResolver};
use crate::error::{Error, ErrorCause, ErrorKind};
use crate::http::{
    normalizer::{normalize_response_error, normalize_transport_error},
    pagination::collect_pages,
    retry::execute_with_retry,
    RateLimitConfig, RateLimiter, RequestBuilder, RetryPolicy, TimeoutConfig,
};
use crate::types::{ApiKind, Credentials, RequestDescriptor, RequestOptions};
use crate::Result;

/// Configuration for the panel client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Retry policy for rate-limited requests
    pub retry_policy: RetryPolicy,
    /// Per-credential request budget
    pub rate_limit: RateLimitConfig,
    /// Connect and request timeouts
    pub timeout: TimeoutConfig,
    /// `User-Agent` sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            rate_limit: RateLimitConfig::default(),
            timeout: TimeoutConfig::default(),
            user_agent: format!("pterodactyl-core/{}", crate::VERSION),
        }
    }
}

impl ClientConfig {
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.retry_policy
            .validate()
            .and_then(|_| self.rate_limit.validate())
            .and_then(|_| self.timeout.validate())
            .map_err(Error::configuration)
    }
}

/// Authenticated, rate-limited client for the panel APIs
#[derive(Clone)]
pub struct PanelClient {
    /// Underlying reqwest client
    http: ReqwestClient,
    /// Request builder for constructing requests
    request_builder: RequestBuilder,
    /// Source of panel credentials
    resolver: Arc<dyn CredentialResolver>,
    /// Shared per-credential request budget
    rate_limiter: RateLimiter,
    /// Client configuration
    config: ClientConfig,
}

impl PanelClient {
    /// Create a new client
    pub fn new(config: ClientConfig, resolver: Arc<dyn CredentialResolver>) -> Result<Self> {
        config.validate()?;

        let http = ReqwestClient::builder()
            .connect_timeout(config.timeout.connect_timeout)
            .timeout(config.timeout.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                Error::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_cause(ErrorCause::capture("BuilderError", &e))
            })?;

        let rate_limiter = RateLimiter::new(config.rate_limit.clone());

        Ok(Self {
            request_builder: RequestBuilder::new(http.clone()),
            http,
            resolver,
            rate_limiter,
            config,
        })
    }

    /// Create with default configuration
    pub fn with_default_config(resolver: Arc<dyn CredentialResolver>) -> Result<Self> {
        Self::new(ClientConfig::default(), resolver)
    }

    /// Use an existing rate limiter, so several clients share one budget
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform one request and return the parsed body
    #[instrument(
        skip_all,
        fields(method = %method, api = %api_kind, endpoint = %endpoint, credential_index)
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn request(
        &self,
        method: Method,
        api_kind: ApiKind,
        endpoint: &str,
        body: Option<Value>,
        query: Option<Map<String, Value>>,
        options: RequestOptions,
        credential_index: usize,
    ) -> Result<Value> {
        let descriptor = RequestDescriptor {
            method,
            api_kind,
            endpoint: endpoint.to_string(),
            body,
            query,
            options,
        };
        self.send(&descriptor, credential_index).await
    }

    /// Fetch every page of a list endpoint and return the items
    #[instrument(
        skip_all,
        fields(method = %method, api = %api_kind, endpoint = %endpoint, credential_index)
    )]
    pub async fn request_all_items(
        &self,
        method: Method,
        api_kind: ApiKind,
        endpoint: &str,
        body: Option<Value>,
        query: Option<Map<String, Value>>,
        credential_index: usize,
    ) -> Result<Vec<Value>> {
        let descriptor = RequestDescriptor {
            method,
            api_kind,
            endpoint: endpoint.to_string(),
            body,
            query,
            options: RequestOptions::default(),
        };
        self.send_all(&descriptor, credential_index).await
    }

    /// Send a prepared descriptor with rate limiting and retries
    pub async fn send(&self, descriptor: &RequestDescriptor, credential_index: usize) -> Result<Value> {
        let credentials = self.resolve(descriptor.api_kind, credential_index)?;
        self.send_with(descriptor, &credentials).await
    }

    /// Walk every page of a descriptor's list endpoint
    pub async fn send_all(&self, descriptor: &RequestDescriptor, credential_index: usize) -> Result<Vec<Value>> {
        let credentials = self.resolve(descriptor.api_kind, credential_index)?;
        collect_pages(|page| {
            let paged = descriptor.for_page(page);
            let credentials = &credentials;
            async move { self.send_with(&paged, credentials).await }
        })
        .await
    }

    async fn send_with(&self, descriptor: &RequestDescriptor, credentials: &Credentials) -> Result<Value> {
        let identity = credentials.identity();
        let identity = &identity;

        execute_with_retry(&self.config.retry_policy, || async move {
            self.rate_limiter.acquire(identity, descriptor.api_kind).await;
            self.execute(descriptor, credentials).await
        })
        .await
    }

    fn resolve(&self, api_kind: ApiKind, credential_index: usize) -> Result<Credentials> {
        let credentials = self.resolver.resolve(api_kind, credential_index)?;
        validate_credentials(api_kind, &credentials)?;
        Ok(credentials)
    }

    /// Make exactly one attempt, without rate limiting or retries
    pub async fn execute(&self, descriptor: &RequestDescriptor, credentials: &Credentials) -> Result<Value> {
        let request = self.request_builder.build_request(descriptor, credentials)?;
        debug!(method = %request.method(), url = %request.url(), "Sending panel request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| normalize_transport_error(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            Error::new(ErrorKind::Decode, format!("Failed to read response body: {}", e))
                .with_status(status.as_u16())
                .with_cause(ErrorCause::capture("BodyError", &e))
        })?;

        if status.is_success() {
            debug!(status = status.as_u16(), bytes = text.len(), "Panel request succeeded");
            return Ok(parse_success_body(status, &text));
        }

        let body = serde_json::from_str::<Value>(&text).ok();
        let error = normalize_response_error(status.as_u16(), body.as_ref());
        debug!(status = status.as_u16(), "Panel request failed: {}", error);
        Err(error)
    }
}

impl fmt::Debug for PanelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelClient")
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// JSON for JSON bodies, `null` for empty ones, a string for anything else
fn parse_success_body(status: StatusCode, text: &str) -> Value {
    if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
        return Value::Null;
    }

    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialSet, StaticCredentialResolver};
    use serde_json::json;
    use std::time::Duration;

    fn client_with(sets: Vec<CredentialSet>) -> PanelClient {
        PanelClient::with_default_config(Arc::new(StaticCredentialResolver::new(sets))).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.retry_policy.max_retries, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.timeout.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("pterodactyl-core/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::default()
            .with_rate_limit(RateLimitConfig::default().with_budget(ApiKind::Client, 0));
        let resolver = Arc::new(StaticCredentialResolver::default());
        let err = PanelClient::new(config, resolver).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_success_body_parsing() {
        assert_eq!(parse_success_body(StatusCode::NO_CONTENT, ""), Value::Null);
        assert_eq!(parse_success_body(StatusCode::OK, "  "), Value::Null);
        assert_eq!(parse_success_body(StatusCode::OK, r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(
            parse_success_body(StatusCode::OK, "server.properties contents"),
            json!("server.properties contents")
        );
    }

    #[tokio::test]
    async fn test_missing_panel_url_fails_before_network() {
        let client = client_with(vec![CredentialSet::new("").with_client_key("ptlc_key")]);
        let err = client
            .request(Method::GET, ApiKind::Client, "/", None, None, RequestOptions::default(), 0)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.starts_with("Panel URL is not configured"));
        assert_eq!(client.rate_limiter().tracked_credentials(), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = client_with(vec![CredentialSet::new("https://panel.example.com")]);
        let err = client
            .request_all_items(Method::GET, ApiKind::Application, "/servers", None, None, 0)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.starts_with("API Key is not configured"));
    }
}
