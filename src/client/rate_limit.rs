//! Dual sliding-window rate limiting with adaptive backoff
//!
//! Riot enforces two quotas at once (per second and per two minutes). The
//! limiter keeps the timestamps of recent requests for both windows and only
//! admits a request when both have room, sleeping until the oldest blocking
//! entry expires otherwise.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use super::backoff::{AdaptiveBackoff, BackoffSnapshot};
use super::config::{ClientConfig, MIN_LIMITER_WAIT};
use super::request::Priority;
use crate::metrics::{record_backoff_multiplier, RateLimiterMetrics};

/// Upper bound on the timestamps preallocated for a window
const MAX_PREALLOCATED: usize = 4096;

/// Timestamps of admitted requests inside one trailing window.
#[derive(Debug, Clone)]
pub struct RateWindow {
    limit: u32,
    duration: Duration,
    timestamps: VecDeque<Instant>,
}

impl RateWindow {
    /// Window admitting `limit` requests per `duration`
    pub fn new(limit: u32, duration: Duration) -> Self {
        Self {
            limit,
            duration,
            timestamps: VecDeque::with_capacity((limit as usize).min(MAX_PREALLOCATED)),
        }
    }

    /// Drop timestamps that are `duration` or more in the past.
    pub fn evict_expired(&mut self, now: Instant) {
        while self
            .timestamps
            .front()
            .is_some_and(|&ts| now.saturating_duration_since(ts) >= self.duration)
        {
            self.timestamps.pop_front();
        }
    }

    /// Whether one more request fits under `effective_limit`.
    pub fn has_capacity(&self, effective_limit: u32) -> bool {
        (self.timestamps.len() as u64) < effective_limit as u64
    }

    /// Record an admitted request.
    pub fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Time until the oldest entry leaves the window.
    ///
    /// An empty window reports the full window duration.
    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.timestamps.front() {
            Some(&oldest) => self
                .duration
                .saturating_sub(now.saturating_duration_since(oldest)),
            None => self.duration,
        }
    }

    /// Effective limit after dividing by the backoff multiplier (at least 1).
    pub fn effective_limit(&self, multiplier: f64) -> u32 {
        ((self.limit as f64 / multiplier).floor() as u32).max(1)
    }

    /// Configured limit
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of timestamps currently held
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the window holds no timestamps
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[derive(Debug)]
struct LimiterState {
    short: RateWindow,
    long: RateWindow,
    backoff: AdaptiveBackoff,
}

/// Rate limiter enforcing a short and a long window simultaneously.
///
/// The backoff multiplier divides both windows' capacity. HIGH priority
/// requests get `burst_allowance` extra capacity on the short window only,
/// so sustained bursts end up bounded by the long window.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
    burst_allowance: f64,
}

impl RateLimiter {
    /// Create a limiter from explicit quotas
    ///
    /// # Arguments
    /// * `short_limit` - Requests per short window
    /// * `short_window` - Short window duration
    /// * `long_limit` - Requests per long window
    /// * `long_window` - Long window duration
    /// * `burst_allowance` - Fractional short-window bonus for HIGH priority
    pub fn new(
        short_limit: u32,
        short_window: Duration,
        long_limit: u32,
        long_window: Duration,
        burst_allowance: f64,
    ) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                short: RateWindow::new(short_limit, short_window),
                long: RateWindow::new(long_limit, long_window),
                backoff: AdaptiveBackoff::new(),
            }),
            burst_allowance,
        }
    }

    /// Create a limiter from a client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.short_limit,
            config.short_window,
            config.long_limit,
            config.long_window,
            config.burst_allowance,
        )
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until both windows admit a request, then reserve a slot in each.
    ///
    /// Returns the total time spent waiting (zero when admitted immediately).
    /// The check-and-reserve step runs under the mutex; sleeping does not.
    pub async fn acquire(&self, priority: Priority) -> Duration {
        let started = Instant::now();
        let mut metrics = RateLimiterMetrics::new();
        metrics.start_acquire();

        loop {
            let wait = {
                let mut state = self.lock();
                let now = Instant::now();

                state.short.evict_expired(now);
                state.long.evict_expired(now);

                let multiplier = state.backoff.refresh_multiplier();
                let mut short_limit = state.short.effective_limit(multiplier);
                let long_limit = state.long.effective_limit(multiplier);

                if priority == Priority::High {
                    short_limit = (short_limit as f64 * (1.0 + self.burst_allowance)).floor() as u32;
                }

                let short_ok = state.short.has_capacity(short_limit);
                let long_ok = state.long.has_capacity(long_limit);

                if short_ok && long_ok {
                    state.short.record(now);
                    state.long.record(now);
                    let waited = now.saturating_duration_since(started);
                    metrics.record_acquired(priority);
                    record_backoff_multiplier(multiplier);
                    trace!(
                        %priority,
                        short_in_window = state.short.len(),
                        long_in_window = state.long.len(),
                        waited_ms = waited.as_millis(),
                        "Rate limit slot acquired"
                    );
                    return waited;
                }

                let mut wait = MIN_LIMITER_WAIT;
                if !short_ok {
                    wait = wait.max(state.short.wait_time(now));
                }
                if !long_ok {
                    wait = wait.max(state.long.wait_time(now));
                }

                debug!(
                    %priority,
                    short_limit,
                    long_limit,
                    multiplier,
                    wait_ms = wait.as_millis(),
                    "Rate limit reached, waiting"
                );
                wait
            };

            sleep(wait).await;
        }
    }

    /// Record a 429 response for adaptive backoff.
    pub fn report_failure(&self) {
        let mut state = self.lock();
        state.backoff.report_failure(Instant::now());
        debug!(
            consecutive_failures = state.backoff.consecutive_failures(),
            "Throttling reported to rate limiter"
        );
    }

    /// Record a successful response for adaptive backoff.
    pub fn report_success(&self) {
        self.lock().backoff.report_success(Instant::now());
    }

    /// Current backoff state
    pub fn backoff_snapshot(&self) -> BackoffSnapshot {
        self.lock().backoff.snapshot()
    }

    /// Requests currently counted in the (short, long) windows.
    pub fn in_flight(&self) -> (usize, usize) {
        let mut state = self.lock();
        let now = Instant::now();
        state.short.evict_expired(now);
        state.long.evict_expired(now);
        (state.short.len(), state.long.len())
    }

    /// Configured (short, long) limits
    pub fn limits(&self) -> (u32, u32) {
        let state = self.lock();
        (state.short.limit(), state.long.limit())
    }
}
