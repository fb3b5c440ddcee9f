//! Pterodactyl Core - request transport for the Pterodactyl Panel APIs
//!
//! Every operation against a panel goes through this crate. It builds
//! authenticated requests for the Client (`/api/client`) and Application
//! (`/api/application`) APIs, keeps each credential inside its request
//! budget, retries rate-limited requests with exponential backoff, turns
//! failures into actionable errors, and walks paginated list endpoints.
//!
//! # Main Components
//!
//! - **Credentials**: [`CredentialResolver`] maps an API kind and index to a panel URL and key
//! - **Rate limiting**: [`RateLimiter`] enforces a fixed 60 second window per credential
//! - **Retry**: [`RetryPolicy`] retries HTTP 429 only, doubling the delay each time
//! - **Errors**: [`Error`] carries a kind, a message, the status code and a flattened cause
//! - **Client**: [`PanelClient`] ties it together
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pterodactyl_core::{
//!     ApiKind, CredentialSet, Method, PanelClient, RequestOptions, Result,
//!     StaticCredentialResolver,
//! };
//!
//! async fn list_servers() -> Result<()> {
//!     let resolver = StaticCredentialResolver::single(
//!         CredentialSet::new("https://panel.example.com").with_client_key("ptlc_xxx"),
//!     );
//!     let client = PanelClient::with_default_config(Arc::new(resolver))?;
//!
//!     let account = client
//!         .request(Method::GET, ApiKind::Client, "/account", None, None, RequestOptions::default(), 0)
//!         .await?;
//!     let servers = client
//!         .request_all_items(Method::GET, ApiKind::Client, "/", None, None, 0)
//!         .await?;
//!     println!("{} owns {} servers", account["attributes"]["username"], servers.len());
//!     Ok(())
//! }
//! ```

pub mod credentials;
pub mod error;
pub mod http;
pub mod types;

pub use credentials::{validate_credentials, CredentialResolver, CredentialSet, StaticCredentialResolver};
pub use error::{Error, ErrorCause, ErrorKind, Result};
pub use http::{
    ClientConfig, Method, PanelClient, RateLimitConfig, RateLimiter, RetryPolicy, StatusCode,
    TimeoutConfig,
};
pub use types::{
    ApiKind, CredentialId, Credentials, RequestDescriptor, RequestOptions, APPLICATION_API_BASE,
    CLIENT_API_BASE, PTERODACTYL_ACCEPT,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
