//! Observability metrics for the Riot API client
//!
//! Counters, gauges and histograms for HTTP calls, 429s, retries, limiter
//! waits, cache lookups, queue depth and export progress.
//!
//! ## Architecture
//!
//! - Uses the `metrics` crate facade; every macro is a no-op until a recorder
//!   is installed
//! - [`init_metrics`] installs a Prometheus exporter with an HTTP scrape
//!   endpoint (e.g. `127.0.0.1:9090/metrics`)

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::client::{Priority, TransportError};

/// Set once the Prometheus recorder is installed
static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Correlation ID generator for request tracing
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Error raised when the exporter cannot be installed
#[derive(Debug, thiserror::Error)]
#[error("failed to install Prometheus exporter on {addr}: {message}")]
pub struct MetricsError {
    addr: SocketAddr,
    message: String,
}

/// Initialize the metrics system with a Prometheus exporter.
///
/// Call once at startup. Later calls are no-ops.
///
/// # Arguments
/// * `addr` - Socket address for the scrape endpoint
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(%existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError {
            addr,
            message: e.to_string(),
        })?;

    describe_counter!(
        "riot_http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the Riot API"
    );
    describe_counter!(
        "riot_http_429_total",
        Unit::Count,
        "Total number of 429 rate limit responses received"
    );
    describe_counter!(
        "riot_http_retries_total",
        Unit::Count,
        "Total number of retry attempts on the direct path"
    );
    describe_histogram!(
        "riot_http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_histogram!(
        "riot_retry_backoff_seconds",
        Unit::Seconds,
        "Delay before a retry in seconds"
    );
    describe_counter!(
        "rate_limit_acquired_total",
        Unit::Count,
        "Total number of rate limiter slots acquired"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for a rate limiter slot"
    );
    describe_gauge!(
        "rate_limit_backoff_multiplier",
        Unit::Count,
        "Current adaptive backoff multiplier"
    );
    describe_counter!(
        "response_cache_lookups_total",
        Unit::Count,
        "Response cache lookups by result"
    );
    describe_gauge!(
        "request_queue_depth",
        Unit::Count,
        "Requests waiting in the priority queue"
    );
    describe_counter!(
        "request_queue_dropped_total",
        Unit::Count,
        "Queued requests dropped after exhausting requeues"
    );
    describe_counter!(
        "export_matches_total",
        Unit::Count,
        "Matches processed by the exporter, by result"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Generate a new correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Timing and outcome of one HTTP call
pub struct HttpRequestMetrics {
    endpoint: String,
    start_time: Instant,
    correlation_id: String,
}

impl HttpRequestMetrics {
    /// Start recording a call to `endpoint` (a bounded label)
    pub fn start(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let correlation_id = generate_correlation_id();

        debug!(
            correlation_id = %correlation_id,
            endpoint = %endpoint,
            "Starting HTTP request"
        );

        Self {
            endpoint,
            start_time: Instant::now(),
            correlation_id,
        }
    }

    /// Record a call that produced a status code
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "riot_http_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => status_code.to_string(),
        )
        .increment(1);

        histogram!(
            "riot_http_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());

        if status_code == 429 {
            counter!(
                "riot_http_429_total",
                "endpoint" => self.endpoint.clone(),
            )
            .increment(1);

            warn!(
                correlation_id = %self.correlation_id,
                endpoint = %self.endpoint,
                duration_ms = duration.as_millis(),
                "Rate limit response (429) received"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = %self.endpoint,
            status = status_code,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    /// Record a call that produced no response
    pub fn record_transport_error(&self, err: &TransportError) {
        let duration = self.start_time.elapsed();
        let kind = match err {
            TransportError::Timeout(_) => "timeout",
            TransportError::Connect(_) => "connect",
            TransportError::Other(_) => "network_error",
        };

        counter!(
            "riot_http_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => kind,
        )
        .increment(1);

        histogram!(
            "riot_http_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());

        warn!(
            correlation_id = %self.correlation_id,
            endpoint = %self.endpoint,
            error = %err,
            duration_ms = duration.as_millis(),
            "Transport error recorded"
        );
    }

    /// Correlation ID of this call
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Record a retry delay on the direct path
pub fn record_retry_backoff(duration: Duration, attempt: u32) {
    counter!(
        "riot_http_retries_total",
        "attempt" => attempt.to_string(),
    )
    .increment(1);

    histogram!("riot_retry_backoff_seconds").record(duration.as_secs_f64());

    debug!(
        attempt = attempt,
        backoff_ms = duration.as_millis(),
        "Retry backoff recorded"
    );
}

/// Rate limiter wait-time helper
pub struct RateLimiterMetrics {
    start_time: Option<Instant>,
}

impl Default for RateLimiterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterMetrics {
    /// Create a new rate limiter metrics instance
    pub fn new() -> Self {
        Self { start_time: None }
    }

    /// Start measuring wait time
    pub fn start_acquire(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Record a successful acquisition
    pub fn record_acquired(&mut self, priority: Priority) {
        if let Some(start) = self.start_time.take() {
            let wait_duration = start.elapsed();

            histogram!("rate_limit_wait_seconds").record(wait_duration.as_secs_f64());

            counter!(
                "rate_limit_acquired_total",
                "priority" => priority.to_string(),
            )
            .increment(1);

            if wait_duration.as_millis() > 100 {
                debug!(
                    %priority,
                    wait_ms = wait_duration.as_millis(),
                    "Rate limit slot acquired after wait"
                );
            }
        }
    }
}

/// Update the backoff multiplier gauge
pub fn record_backoff_multiplier(multiplier: f64) {
    gauge!("rate_limit_backoff_multiplier").set(multiplier);
}

/// Count a cache lookup
pub fn record_cache_lookup(hit: bool) {
    counter!(
        "response_cache_lookups_total",
        "result" => if hit { "hit" } else { "miss" },
    )
    .increment(1);
}

/// Update the queue depth gauge
pub fn record_queue_depth(depth: usize) {
    gauge!("request_queue_depth").set(depth as f64);
}

/// Count a queued request dropped after exhausting requeues
pub fn record_request_dropped(endpoint: &str) {
    counter!(
        "request_queue_dropped_total",
        "endpoint" => endpoint.to_string(),
    )
    .increment(1);
}

/// Per-export progress metrics
pub struct ExportMetrics {
    player: String,
    start_time: Instant,
}

impl ExportMetrics {
    /// Start tracking an export for `player`
    pub fn start(player: impl Into<String>) -> Self {
        let player = player.into();
        info!(player = %player, "Export started");
        Self {
            player,
            start_time: Instant::now(),
        }
    }

    /// Count one exported match
    pub fn record_match_saved(&self) {
        counter!("export_matches_total", "result" => "saved").increment(1);
    }

    /// Count one match that could not be exported
    pub fn record_match_failed(&self, match_id: &str, error: &str) {
        counter!("export_matches_total", "result" => "failed").increment(1);
        warn!(player = %self.player, match_id, error, "Match export failed");
    }

    /// Log the end of a successful export
    pub fn record_success(&self, saved: usize, failed: usize) {
        info!(
            player = %self.player,
            saved,
            failed,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Export completed"
        );
    }

    /// Log an export that aborted
    pub fn record_failure(&self, error: &str) {
        error!(
            player = %self.player,
            error = %error,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Export failed"
        );
    }
}
