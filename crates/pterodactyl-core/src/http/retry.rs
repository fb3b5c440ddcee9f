//! Retry logic with exponential backoff for rate-limited requests
//!
//! Only HTTP 429 answers are retried. Every other failure is returned after
//! the first attempt.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{Error, ErrorKind};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each retry after it
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the base delay
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Policy that never retries
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Longest delay the schedule can produce
    pub fn max_delay(&self) -> Duration {
        let factor = 2u32.saturating_pow(self.max_retries.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Create the exponential backoff schedule, without jitter
    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_delay().max(self.base_delay),
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay.is_zero() && self.max_retries > 0 {
            return Err("base_delay cannot be zero when retries are enabled".to_string());
        }
        Ok(())
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Hand the error back to the caller
    NoRetry,
    /// 429 persisted through every retry
    Exhausted,
}

/// Tracks retries for one logical request
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: u32,
    backoff: ExponentialBackoff,
}

impl RetryHandler {
    /// Create a new retry handler with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            attempts: 0,
            backoff,
        }
    }

    /// Decide what to do after a failed attempt
    pub fn should_retry(&mut self, error: &Error) -> RetryDecision {
        if !error.should_retry() {
            return RetryDecision::NoRetry;
        }

        if self.attempts >= self.policy.max_retries {
            return RetryDecision::Exhausted;
        }

        let delay = self.next_delay();
        self.attempts += 1;
        RetryDecision::Retry { delay }
    }

    /// `base_delay * 2^attempts`, truncated to whole milliseconds
    fn next_delay(&mut self) -> Duration {
        let delay = self
            .backoff
            .next_backoff()
            .unwrap_or_else(|| self.policy.max_delay());
        Duration::from_millis(delay.as_millis() as u64)
    }

    /// Number of retries scheduled so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Terminal error once every retry was spent on 429 answers
pub fn retries_exhausted(max_retries: u32, last: &Error) -> Error {
    let mut exhausted = Error::new(
        ErrorKind::RetriesExhausted,
        format!(
            "Pterodactyl request failed: max retries exceeded ({} retries) - {}",
            max_retries, last.message
        ),
    );
    exhausted.status_code = last.status_code.or(Some(429));
    exhausted.cause = last.cause.clone();
    exhausted
}

/// Execute a request with retry logic.
///
/// `request_fn` is invoked once per attempt and must perform the whole
/// attempt, including the rate limiter check.
pub async fn execute_with_retry<F, Fut, T>(policy: &RetryPolicy, mut request_fn: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut handler = RetryHandler::new(policy.clone());

    loop {
        let error = match request_fn().await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        match handler.should_retry(&error) {
            RetryDecision::Retry { delay } => {
                warn!(
                    attempt = handler.attempts(),
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited by panel, backing off: {}",
                    error
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::Exhausted => {
                error!(
                    max_retries = policy.max_retries,
                    "Rate limited after every retry, giving up: {}",
                    error
                );
                return Err(retries_exhausted(policy.max_retries, &error));
            }
            RetryDecision::NoRetry => return Err(error),
        }
    }
}
