//! Adaptive backoff: shrinks the limiter's effective capacity after 429s
//!
//! Repeated upstream rejections within a minute of each other raise the
//! multiplier (up to 2.0, halving the effective quota); quiet periods let it
//! relax back toward 1.0 by 5% per limiter check.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Failures further apart than this start a new streak.
pub const FAILURE_MEMORY: Duration = Duration::from_secs(60);

/// Multiplier increase per consecutive failure.
pub const MULTIPLIER_STEP: f64 = 0.2;

/// Upper bound of the multiplier.
pub const MAX_MULTIPLIER: f64 = 2.0;

/// Relaxation factor applied on every refresh without active failures.
pub const MULTIPLIER_DECAY: f64 = 0.95;

/// Backoff state owned by the rate limiter.
#[derive(Debug, Clone)]
pub struct AdaptiveBackoff {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    multiplier: f64,
}

/// Point-in-time view of the backoff state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackoffSnapshot {
    /// Current capacity divisor (1.0 = no backoff)
    pub multiplier: f64,
    /// Failures in the current streak
    pub consecutive_failures: u32,
}

impl Default for AdaptiveBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveBackoff {
    /// Fresh state with no recorded failures
    pub fn new() -> Self {
        Self {
            consecutive_failures: 0,
            last_failure: None,
            multiplier: 1.0,
        }
    }

    /// Record a throttling response received at `now`.
    pub fn report_failure(&mut self, now: Instant) {
        let within_streak = self
            .last_failure
            .is_some_and(|last| now.saturating_duration_since(last) < FAILURE_MEMORY);

        self.consecutive_failures = if within_streak {
            self.consecutive_failures.saturating_add(1)
        } else {
            1
        };
        self.last_failure = Some(now);
    }

    /// Record a successful response received at `now`.
    ///
    /// Only decays the streak once the last failure is older than
    /// [`FAILURE_MEMORY`].
    pub fn report_success(&mut self, now: Instant) {
        let quiet = self
            .last_failure
            .map_or(true, |last| now.saturating_duration_since(last) > FAILURE_MEMORY);

        if quiet {
            self.consecutive_failures = self.consecutive_failures.saturating_sub(1);
        }
    }

    /// Recompute the multiplier from the failure streak and return it.
    pub fn refresh_multiplier(&mut self) -> f64 {
        self.multiplier = if self.consecutive_failures > 0 {
            (1.0 + MULTIPLIER_STEP * self.consecutive_failures as f64).min(MAX_MULTIPLIER)
        } else {
            (self.multiplier * MULTIPLIER_DECAY).max(1.0)
        };
        self.multiplier
    }

    /// Multiplier as of the last refresh
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Failures in the current streak
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Copy of the observable state
    pub fn snapshot(&self) -> BackoffSnapshot {
        BackoffSnapshot {
            multiplier: self.multiplier,
            consecutive_failures: self.consecutive_failures,
        }
    }
}
