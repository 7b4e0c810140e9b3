//! Rate-limited HTTP attempts and the direct-path retry loop

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::config::{calculate_backoff, MAX_BACKOFF_MS};
use super::rate_limit::RateLimiter;
use super::request::{ApiRequest, ApiResponse};
use super::retry_formatter::{RetryContext, RetryErrorType};
use super::stats::RequestStats;
use super::transport::{parse_retry_after, Transport, TransportError};
use super::{ClientError, ClientResult};
use crate::metrics::{record_retry_backoff, HttpRequestMetrics};

/// Classified result of one HTTP attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// 2xx response
    Success(ApiResponse),
    /// 429 response, with the parsed `Retry-After` if one was sent
    RateLimited {
        /// Server-requested delay
        retry_after: Option<Duration>,
    },
    /// 5xx response
    ServerError {
        /// HTTP status
        status: u16,
    },
    /// No response at all
    Transport(TransportError),
    /// Any other status; retrying will not help
    Rejected {
        /// HTTP status
        status: u16,
        /// Response body, kept as the error message
        body: String,
    },
}

impl AttemptOutcome {
    /// Whether another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::Transport(_)
        )
    }
}

/// Executes requests against a [`Transport`], gated by a [`RateLimiter`].
pub struct RetryExecutor {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    stats: Arc<RequestStats>,
    max_attempts: u32,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    /// Create an executor; `max_attempts` is clamped to at least 1.
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        stats: Arc<RequestStats>,
        max_attempts: u32,
    ) -> Self {
        Self {
            transport,
            limiter,
            stats,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Attempt budget of [`execute`](Self::execute)
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Perform one limiter-gated HTTP call and classify the result.
    ///
    /// Feeds the outcome to the adaptive backoff controller and the request
    /// counters. Never sleeps beyond the limiter wait.
    pub async fn attempt(&self, request: &ApiRequest) -> AttemptOutcome {
        let waited = self.limiter.acquire(request.priority).await;
        if !waited.is_zero() {
            debug!(
                endpoint = request.endpoint(),
                waited_ms = waited.as_millis(),
                "Waited for rate limiter"
            );
        }

        let metrics = HttpRequestMetrics::start(request.endpoint_label());
        self.stats.record_sent();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                metrics.record_transport_error(&err);
                self.stats.record_failure();
                return AttemptOutcome::Transport(err);
            }
        };
        metrics.record_complete(response.status);

        match response.status {
            200..=299 => {
                self.limiter.report_success();
                self.stats.record_success();
                AttemptOutcome::Success(response)
            }
            429 => {
                self.limiter.report_failure();
                self.stats.record_rate_limited();
                AttemptOutcome::RateLimited {
                    retry_after: response.retry_after.as_deref().and_then(parse_retry_after),
                }
            }
            status if status >= 500 => {
                self.stats.record_failure();
                AttemptOutcome::ServerError { status }
            }
            status => {
                self.stats.record_failure();
                AttemptOutcome::Rejected {
                    status,
                    body: response.body,
                }
            }
        }
    }

    /// Execute `request` with retries.
    ///
    /// 429 waits `Retry-After` when present, otherwise the current exponential
    /// delay; 5xx and transport failures wait the exponential delay. The delay
    /// starts at 1s and doubles after every failed attempt up to 16s. Other
    /// statuses fail immediately with [`ClientError::Application`].
    ///
    /// # Errors
    /// [`ClientError::Exhausted`] once `max_attempts` attempts have failed.
    pub async fn execute(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let endpoint = request.endpoint();
        let max_backoff = Duration::from_millis(MAX_BACKOFF_MS);
        let mut backoff = calculate_backoff(0);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let (error_type, delay) = match self.attempt(request).await {
                AttemptOutcome::Success(response) => {
                    if attempt > 1 {
                        let ctx = RetryContext::new(
                            attempt,
                            self.max_attempts,
                            RetryErrorType::NetworkGeneric,
                            Duration::ZERO,
                            endpoint,
                            "",
                        );
                        info!(endpoint, attempt, "{}", ctx.format_success());
                    }
                    return Ok(response);
                }
                AttemptOutcome::Rejected { status, body } => {
                    warn!(endpoint, status, "Request rejected, not retrying");
                    return Err(ClientError::Application { status, body });
                }
                AttemptOutcome::RateLimited { retry_after } => {
                    last_error = "HTTP 429 Too Many Requests".to_string();
                    (RetryErrorType::RateLimit, retry_after.unwrap_or(backoff))
                }
                AttemptOutcome::ServerError { status } => {
                    last_error = format!("HTTP {status}");
                    (RetryErrorType::ServerError(status), backoff)
                }
                AttemptOutcome::Transport(err) => {
                    let error_type = RetryErrorType::from_transport(&err);
                    last_error = err.to_string();
                    (error_type, backoff)
                }
            };

            backoff = backoff.saturating_mul(2).min(max_backoff);

            let ctx = RetryContext::new(
                attempt,
                self.max_attempts,
                error_type,
                delay,
                endpoint,
                last_error.as_str(),
            );

            if attempt == self.max_attempts {
                error!(endpoint, attempts = attempt, "{}", ctx.format_failure());
                break;
            }

            warn!(
                endpoint,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis(),
                "{}",
                ctx.format_retry()
            );
            record_retry_backoff(delay, attempt);
            sleep(delay).await;
        }

        Err(ClientError::Exhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}
