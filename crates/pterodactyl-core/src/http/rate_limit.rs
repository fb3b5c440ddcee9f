//! Per-credential request budget over a fixed window
//!
//! Each (panel URL, API key) pair gets its own request counter. Once the
//! counter reaches the budget for the sub-API, callers on that credential are
//! held back until the window has run out.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::types::{ApiKind, CredentialId};

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of one accounting window
    pub window: Duration,
    /// Requests allowed per window for Client API keys
    pub client_budget: u32,
    /// Requests allowed per window for Application API keys
    pub application_budget: u32,
    /// Upper bound on credentials tracked at once; least recently used
    /// windows are dropped beyond it
    pub max_tracked_credentials: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            client_budget: ApiKind::Client.default_budget(),
            application_budget: ApiKind::Application.default_budget(),
            max_tracked_credentials: 1024,
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with explicit budgets
    pub fn new(window: Duration, client_budget: u32, application_budget: u32) -> Self {
        Self {
            window,
            client_budget,
            application_budget,
            ..Default::default()
        }
    }

    /// Budget applied to credentials of `kind`
    pub fn budget_for(&self, kind: ApiKind) -> u32 {
        match kind {
            ApiKind::Client => self.client_budget,
            ApiKind::Application => self.application_budget,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_budget(mut self, kind: ApiKind, budget: u32) -> Self {
        match kind {
            ApiKind::Client => self.client_budget = budget,
            ApiKind::Application => self.application_budget = budget,
        }
        self
    }

    pub fn with_max_tracked_credentials(mut self, max: usize) -> Self {
        self.max_tracked_credentials = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window.is_zero() {
            return Err("rate limit window cannot be zero".to_string());
        }
        if self.client_budget == 0 {
            return Err("client_budget cannot be zero".to_string());
        }
        if self.application_budget == 0 {
            return Err("application_budget cannot be zero".to_string());
        }
        if self.max_tracked_credentials == 0 {
            return Err("max_tracked_credentials cannot be zero".to_string());
        }
        Ok(())
    }
}

/// Counter for one credential
#[derive(Debug, Clone, Copy)]
struct WindowState {
    window_start: Instant,
    request_count: u32,
}

impl WindowState {
    fn starting_at(now: Instant) -> Self {
        Self {
            window_start: now,
            request_count: 0,
        }
    }
}

/// Snapshot of one credential's window, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    /// Requests counted in the current window
    pub request_count: u32,
    /// Time since the window opened
    pub age: Duration,
}

type SharedWindow = Arc<AsyncMutex<WindowState>>;

/// Fixed-window rate limiter keyed by credential.
///
/// The map lock is only held to find or insert a credential's entry; the
/// check-and-increment itself runs under that credential's own lock, so
/// different credentials never wait on each other.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<LruCache<CredentialId, SharedWindow>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_tracked_credentials).unwrap_or(NonZeroUsize::MIN);

        Self {
            config,
            windows: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request against `credential`, waiting first if its budget
    /// for the current window is spent.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&self, credential: &CredentialId, kind: ApiKind) -> Duration {
        let budget = self.config.budget_for(kind);
        let window = self.window_for(credential);
        let mut state = window.lock().await;

        let now = Instant::now();
        if now.duration_since(state.window_start) > self.config.window {
            *state = WindowState::starting_at(now);
        }

        let mut waited = Duration::ZERO;
        if state.request_count >= budget {
            let elapsed = now.duration_since(state.window_start);
            waited = self.config.window.saturating_sub(elapsed);

            warn!(
                panel = %credential,
                api = %kind,
                budget,
                wait_ms = waited.as_millis() as u64,
                "Request budget exhausted, waiting for the window to reset"
            );

            sleep(waited).await;
            // Restarts at the wake-up time, not the scheduled boundary
            *state = WindowState::starting_at(Instant::now());
        }

        state.request_count += 1;
        debug!(
            panel = %credential,
            api = %kind,
            request_count = state.request_count,
            budget,
            "Rate limit permit granted"
        );

        waited
    }

    /// Current window of `credential`, if it is tracked
    pub async fn window_status(&self, credential: &CredentialId) -> Option<WindowStatus> {
        let window = {
            let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
            windows.peek(credential).cloned()
        }?;

        let state = window.lock().await;
        Some(WindowStatus {
            request_count: state.request_count,
            age: Instant::now().duration_since(state.window_start),
        })
    }

    /// Number of credentials currently tracked
    pub fn tracked_credentials(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn window_for(&self, credential: &CredentialId) -> SharedWindow {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(window) = windows.get(credential) {
            return Arc::clone(window);
        }

        let now = Instant::now();
        if windows.len() >= windows.cap().get() {
            if let Some(expired) = self.oldest_expired(&windows, now) {
                windows.pop(&expired);
                debug!(panel = %expired, "Dropped expired rate limit window");
            }
        }

        let window = Arc::new(AsyncMutex::new(WindowState::starting_at(now)));
        if let Some((evicted, _)) = windows.push(credential.clone(), Arc::clone(&window)) {
            warn!(panel = %evicted, "Evicted a live rate limit window; every tracked credential is active");
        }
        window
    }

    /// Least recently used window whose period has run out. Windows locked by
    /// an in-flight `acquire` count as live.
    fn oldest_expired(
        &self,
        windows: &LruCache<CredentialId, SharedWindow>,
        now: Instant,
    ) -> Option<CredentialId> {
        windows
            .iter()
            .rev()
            .find(|(_, window)| {
                window
                    .try_lock()
                    .map(|state| now.duration_since(state.window_start) > self.config.window)
                    .unwrap_or(false)
            })
            .map(|(credential, _)| credential.clone())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("tracked_credentials", &self.tracked_credentials())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Credentials;

    fn credential(key: &str) -> CredentialId {
        Credentials::new("https://panel.example.com", key).identity()
    }

    fn limiter(budget: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::new(Duration::from_secs(60), budget, budget))
    }

    #[test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.client_budget, 720);
        assert_eq!(config.application_budget, 240);
        assert_eq!(config.budget_for(ApiKind::Application), 240);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_limit_config_validation() {
        let mut config = RateLimitConfig::default();

        config.window = Duration::ZERO;
        assert!(config.validate().is_err());

        config.window = Duration::from_secs(60);
        config.client_budget = 0;
        assert!(config.validate().is_err());

        config.client_budget = 10;
        config.max_tracked_credentials = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_requests_never_wait() {
        let limiter = limiter(5);
        let id = credential("k");

        for _ in 0..5 {
            assert_eq!(limiter.acquire(&id, ApiKind::Client).await, Duration::ZERO);
        }

        let status = limiter.window_status(&id).await.unwrap();
        assert_eq!(status.request_count, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_over_budget_waits_once() {
        let limiter = limiter(3);
        let id = credential("k");

        for _ in 0..3 {
            limiter.acquire(&id, ApiKind::Client).await;
        }

        tokio::time::advance(Duration::from_secs(20)).await;
        let start = Instant::now();
        let waited = limiter.acquire(&id, ApiKind::Client).await;

        assert_eq!(waited, Duration::from_secs(40));
        assert_eq!(start.elapsed(), Duration::from_secs(40));

        // The window restarted at wake-up and already counts this request
        let status = limiter.window_status(&id).await.unwrap();
        assert_eq!(status.request_count, 1);
        assert_eq!(status.age, Duration::ZERO);

        assert_eq!(limiter.acquire(&id, ApiKind::Client).await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_window_resets_without_waiting() {
        let limiter = limiter(2);
        let id = credential("k");

        limiter.acquire(&id, ApiKind::Client).await;
        limiter.acquire(&id, ApiKind::Client).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.acquire(&id, ApiKind::Client).await, Duration::ZERO);
        assert_eq!(limiter.window_status(&id).await.unwrap().request_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_depends_on_api_kind() {
        let limiter = RateLimiter::new(RateLimitConfig::new(Duration::from_secs(60), 3, 1));
        let client = credential("client-key");
        let application = credential("application-key");

        assert_eq!(limiter.acquire(&application, ApiKind::Application).await, Duration::ZERO);
        assert_eq!(
            limiter.acquire(&application, ApiKind::Application).await,
            Duration::from_secs(60)
        );

        for _ in 0..3 {
            assert_eq!(limiter.acquire(&client, ApiKind::Client).await, Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_credentials_are_isolated() {
        let limiter = limiter(1);
        let first = credential("k1");
        let second = credential("k2");

        assert_eq!(limiter.acquire(&first, ApiKind::Client).await, Duration::ZERO);
        assert_eq!(limiter.acquire(&second, ApiKind::Client).await, Duration::ZERO);
        assert_eq!(limiter.tracked_credentials(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_at_last_permit() {
        let limiter = limiter(2);
        let id = credential("k");

        limiter.acquire(&id, ApiKind::Client).await;

        let (a, b) = tokio::join!(
            limiter.acquire(&id, ApiKind::Client),
            limiter.acquire(&id, ApiKind::Client),
        );

        let mut waits = [a, b];
        waits.sort();
        assert_eq!(waits, [Duration::ZERO, Duration::from_secs(60)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_on_one_credential_does_not_block_another() {
        let limiter = limiter(1);
        let busy = credential("busy");
        let idle = credential("idle");

        limiter.acquire(&busy, ApiKind::Client).await;

        let blocked = {
            let limiter = limiter.clone();
            let busy = busy.clone();
            tokio::spawn(async move { limiter.acquire(&busy, ApiKind::Client).await })
        };
        tokio::task::yield_now().await;

        let start = Instant::now();
        assert_eq!(limiter.acquire(&idle, ApiKind::Client).await, Duration::ZERO);
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert_eq!(blocked.await.unwrap(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracked_credentials_are_bounded() {
        let limiter = RateLimiter::new(
            RateLimitConfig::new(Duration::from_secs(60), 10, 10).with_max_tracked_credentials(2),
        );

        for key in ["a", "b", "c"] {
            limiter.acquire(&credential(key), ApiKind::Client).await;
        }

        assert_eq!(limiter.tracked_credentials(), 2);
        assert!(limiter.window_status(&credential("a")).await.is_none());
        assert!(limiter.window_status(&credential("c")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_window_is_evicted_before_live_one() {
        let limiter = RateLimiter::new(
            RateLimitConfig::new(Duration::from_secs(60), 2, 2).with_max_tracked_credentials(2),
        );
        let (stale, live, fresh) = (credential("stale"), credential("live"), credential("fresh"));

        limiter.acquire(&stale, ApiKind::Client).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.acquire(&live, ApiKind::Client).await;
        tokio::time::advance(Duration::from_secs(20)).await;
        // Most recently used, but its window opened at t=0
        limiter.acquire(&stale, ApiKind::Client).await;
        tokio::time::advance(Duration::from_secs(15)).await;

        limiter.acquire(&fresh, ApiKind::Client).await;

        assert!(limiter.window_status(&stale).await.is_none());
        assert!(limiter.window_status(&fresh).await.is_some());
        assert_eq!(limiter.window_status(&live).await.unwrap().request_count, 1);

        // The surviving window still enforces its budget
        assert_eq!(limiter.acquire(&live, ApiKind::Client).await, Duration::ZERO);
        assert_eq!(
            limiter.acquire(&live, ApiKind::Client).await,
            Duration::from_secs(25)
        );
    }
}
