//! Client configuration constants and tunables

use std::time::Duration;

use super::ClientError;

/// Requests allowed in the short window (Riot development key: 20 per second).
pub const DEFAULT_SHORT_LIMIT: u32 = 20;

/// Duration of the short window.
pub const DEFAULT_SHORT_WINDOW: Duration = Duration::from_secs(1);

/// Requests allowed in the long window (Riot development key: 100 per 2 minutes).
pub const DEFAULT_LONG_LIMIT: u32 = 100;

/// Duration of the long window.
pub const DEFAULT_LONG_WINDOW: Duration = Duration::from_secs(120);

/// Extra short-window capacity granted to HIGH priority requests (10%).
pub const DEFAULT_BURST_ALLOWANCE: f64 = 0.1;

/// Maximum HTTP attempts on the direct (`submit`) path.
pub const MAX_ATTEMPTS: u32 = 6;

/// Maximum number of times the queue worker re-enqueues a failed request.
pub const MAX_REQUEUES: u32 = 3;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// Doubling from 1s reaches the ceiling on the fifth consecutive failure.
pub const MAX_BACKOFF_MS: u64 = 16_000;

/// HTTP connect timeout (seconds)
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds) for the whole call
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of cached responses.
pub const DEFAULT_CACHE_CAPACITY: usize = 2000;

/// TTL for match endpoints (match data and timelines).
pub const MATCH_TTL: Duration = Duration::from_secs(300);

/// TTL for every other endpoint.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Shortest sleep between two limiter checks.
pub const MIN_LIMITER_WAIT: Duration = Duration::from_millis(1);

/// Calculate exponential backoff delay for the given retry count (0-based).
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let factor = 2u64.saturating_pow(retry_count);
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}

/// Tunables for an [`ApiClient`](super::ApiClient).
///
/// Every field has a default matching the Riot development-key quota; the
/// `with_*` methods override them one at a time.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Requests allowed per short window
    pub short_limit: u32,
    /// Short window duration
    pub short_window: Duration,
    /// Requests allowed per long window
    pub long_limit: u32,
    /// Long window duration
    pub long_window: Duration,
    /// Fractional short-window bonus for HIGH priority
    pub burst_allowance: f64,
    /// Attempts per request on the direct path
    pub max_attempts: u32,
    /// Requeues per request on the queued path
    pub max_requeues: u32,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Maximum cached responses
    pub cache_capacity: usize,
    /// TTL applied to URLs containing "match"
    pub match_ttl: Duration,
    /// TTL applied to every other URL
    pub default_ttl: Duration,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            short_limit: DEFAULT_SHORT_LIMIT,
            short_window: DEFAULT_SHORT_WINDOW,
            long_limit: DEFAULT_LONG_LIMIT,
            long_window: DEFAULT_LONG_WINDOW,
            burst_allowance: DEFAULT_BURST_ALLOWANCE,
            max_attempts: MAX_ATTEMPTS,
            max_requeues: MAX_REQUEUES,
            connect_timeout: Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            match_ttl: MATCH_TTL,
            default_ttl: DEFAULT_TTL,
            user_agent: format!("lol-match-exporter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Override the short window quota
    pub fn with_short_window(mut self, limit: u32, window: Duration) -> Self {
        self.short_limit = limit;
        self.short_window = window;
        self
    }

    /// Override the long window quota
    pub fn with_long_window(mut self, limit: u32, window: Duration) -> Self {
        self.long_limit = limit;
        self.long_window = window;
        self
    }

    /// Override the HIGH priority burst allowance
    pub fn with_burst_allowance(mut self, burst_allowance: f64) -> Self {
        self.burst_allowance = burst_allowance;
        self
    }

    /// Override the direct-path attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Override the queue requeue budget
    pub fn with_max_requeues(mut self, max_requeues: u32) -> Self {
        self.max_requeues = max_requeues;
        self
    }

    /// Override the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the cache capacity
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Override both cache TTLs
    pub fn with_ttls(mut self, match_ttl: Duration, default_ttl: Duration) -> Self {
        self.match_ttl = match_ttl;
        self.default_ttl = default_ttl;
        self
    }

    /// TTL to use when caching a response for `url`.
    pub fn ttl_for(&self, url: &str) -> Duration {
        if url.contains("match") {
            self.match_ttl
        } else {
            self.default_ttl
        }
    }

    /// Reject configurations the limiter or executor cannot honour.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.short_limit == 0 || self.long_limit == 0 {
            return Err(ClientError::Configuration(
                "window limits must be at least 1".to_string(),
            ));
        }
        if self.short_window.is_zero() || self.long_window.is_zero() {
            return Err(ClientError::Configuration(
                "window durations must be non-zero".to_string(),
            ));
        }
        if !(self.burst_allowance >= 0.0 && self.burst_allowance.is_finite()) {
            return Err(ClientError::Configuration(format!(
                "burst allowance must be a non-negative number, got {}",
                self.burst_allowance
            )));
        }
        if self.max_attempts == 0 {
            return Err(ClientError::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
