//! HTTP transport for the panel APIs
//!
//! This module provides:
//! - Request building with panel authentication headers
//! - Per-credential fixed-window rate limiting
//! - Retry with exponential backoff for 429 answers
//! - Error normalization with actionable status hints
//! - Aggregation of paginated list endpoints

pub mod builder;
pub mod client;
pub mod normalizer;
pub mod pagination;
pub mod rate_limit;
pub mod retry;
pub mod timeout;

pub use builder::RequestBuilder;
pub use client::{ClientConfig, PanelClient};
pub use normalizer::{normalize_error, normalize_response_error, normalize_transport_error};
pub use pagination::{collect_pages, Pagination};
pub use rate_limit::{RateLimitConfig, RateLimiter, WindowStatus};
pub use retry::{execute_with_retry, RetryDecision, RetryPolicy};
pub use timeout::TimeoutConfig;

// Re-export commonly used types
pub use reqwest::{Method, StatusCode};
