//! Shared helpers for the transport integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pterodactyl_core::{
    ClientConfig, CredentialSet, PanelClient, RateLimitConfig, RetryPolicy,
    StaticCredentialResolver,
};
use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

pub const CLIENT_KEY: &str = "ptlc_test_client_key";
pub const APPLICATION_KEY: &str = "ptla_test_application_key";

/// Retry policy with millisecond delays so tests run in real time
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy::default().with_base_delay(Duration::from_millis(5))
}

pub fn fast_config() -> ClientConfig {
    ClientConfig::default().with_retry_policy(fast_retry_policy())
}

/// Credential set pointing at `panel_url` with both keys configured
pub fn credential_set(panel_url: &str) -> CredentialSet {
    CredentialSet::new(panel_url)
        .with_client_key(CLIENT_KEY)
        .with_application_key(APPLICATION_KEY)
}

pub fn client_for(panel_url: &str) -> PanelClient {
    client_with_config(panel_url, fast_config())
}

pub fn client_with_config(panel_url: &str, config: ClientConfig) -> PanelClient {
    let resolver = StaticCredentialResolver::single(credential_set(panel_url));
    PanelClient::new(config, Arc::new(resolver)).expect("valid client config")
}

/// Config whose window admits `budget` client requests per `window`
pub fn tight_rate_limit(budget: u32, window: Duration) -> ClientConfig {
    fast_config().with_rate_limit(
        RateLimitConfig::default()
            .with_window(window)
            .with_budget(pterodactyl_core::ApiKind::Client, budget),
    )
}

/// A list page in the panel's wire format
pub fn list_page(items: Vec<Value>, current_page: u64, total_pages: u64) -> Value {
    json!({
        "object": "list",
        "data": items,
        "meta": {
            "pagination": {
                "total": items_total(total_pages),
                "count": 2,
                "per_page": 2,
                "current_page": current_page,
                "total_pages": total_pages,
                "links": {}
            }
        }
    })
}

fn items_total(total_pages: u64) -> u64 {
    total_pages * 2
}

pub fn server_object(identifier: &str) -> Value {
    json!({
        "object": "server",
        "attributes": {
            "identifier": identifier,
            "name": format!("Server {}", identifier),
        }
    })
}

/// Answers 429 for the first `failures` requests, then 200 with `body`
pub struct RateLimitedThenOk {
    pub failures: u32,
    pub body: Value,
    pub calls: Arc<AtomicU32>,
}

impl RateLimitedThenOk {
    pub fn new(failures: u32, body: Value) -> Self {
        Self {
            failures,
            body,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl Respond for RateLimitedThenOk {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            ResponseTemplate::new(429).set_body_json(json!({
                "errors": [{
                    "code": "TooManyRequestsHttpException",
                    "status": "429",
                    "detail": "Too Many Attempts."
                }]
            }))
        } else {
            ResponseTemplate::new(200).set_body_json(self.body.clone())
        }
    }
}
