//! Request counters and the statistics snapshot

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

use super::backoff::BackoffSnapshot;
use super::cache::CacheStats;

/// Lock-free request counters shared by the executor and the worker.
#[derive(Debug)]
pub struct RequestStats {
    started_at: Instant,
    total: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rate_limited: AtomicU64,
    dropped: AtomicU64,
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStats {
    /// Counters starting at zero, uptime measured from now
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// An HTTP call was sent
    pub fn record_sent(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// A call returned 2xx
    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// A call failed with 5xx, a transport error or a permanent status
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// A call returned 429
    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// A queued request ran out of requeues
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Total calls sent
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Calls that returned 2xx
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Failed calls, excluding 429s
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Calls answered with 429
    pub fn rate_limited(&self) -> u64 {
        self.rate_limited.load(Ordering::Relaxed)
    }

    /// Queued requests dropped after exhausting requeues
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Build a snapshot combining these counters with cache, queue and
    /// backoff state.
    pub fn snapshot(
        &self,
        cache: CacheStats,
        queue_depth: usize,
        backoff: BackoffSnapshot,
    ) -> ClientStatistics {
        let uptime = self.started_at.elapsed();
        let total = self.total();
        let failed = self.failed();

        let success_rate = (1.0 - failed as f64 / total.max(1) as f64) * 100.0;
        let minutes = (uptime.as_secs_f64() / 60.0).max(1.0);

        ClientStatistics {
            uptime_seconds: uptime.as_secs_f64(),
            total_requests: total,
            successful_requests: self.succeeded(),
            failed_requests: failed,
            rate_limited_requests: self.rate_limited(),
            dropped_requests: self.dropped(),
            success_rate,
            requests_per_minute: total as f64 / minutes,
            cache,
            queue_depth,
            backoff,
        }
    }
}

/// Point-in-time client statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStatistics {
    /// Seconds since the client was created
    pub uptime_seconds: f64,
    /// HTTP calls sent
    pub total_requests: u64,
    /// Calls that returned 2xx
    pub successful_requests: u64,
    /// Calls that failed for reasons other than throttling
    pub failed_requests: u64,
    /// Calls answered with 429
    pub rate_limited_requests: u64,
    /// Queued requests dropped after exhausting requeues
    pub dropped_requests: u64,
    /// Percentage of calls that did not fail (100 when none were sent)
    pub success_rate: f64,
    /// Average calls per minute, with uptime floored at one minute
    pub requests_per_minute: f64,
    /// Response cache counters
    pub cache: CacheStats,
    /// Requests waiting in the priority queue
    pub queue_depth: usize,
    /// Adaptive backoff state
    pub backoff: BackoffSnapshot,
}

impl fmt::Display for ClientStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Uptime:            {:.0}s", self.uptime_seconds)?;
        writeln!(f, "Requests:          {}", self.total_requests)?;
        writeln!(f, "Succeeded:         {}", self.successful_requests)?;
        writeln!(f, "Failed:            {}", self.failed_requests)?;
        writeln!(f, "Rate limited:      {}", self.rate_limited_requests)?;
        writeln!(f, "Dropped:           {}", self.dropped_requests)?;
        writeln!(f, "Success rate:      {:.1}%", self.success_rate)?;
        writeln!(f, "Requests/minute:   {:.1}", self.requests_per_minute)?;
        writeln!(f, "Cache:             {}", self.cache)?;
        writeln!(f, "Queue depth:       {}", self.queue_depth)?;
        write!(
            f,
            "Backoff:           x{:.2} ({} consecutive 429s)",
            self.backoff.multiplier, self.backoff.consecutive_failures
        )
    }
}
