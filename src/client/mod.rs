//! Riot API client core: rate limiting, caching, retries and queueing
//!
//! Requests flow through a response cache, a dual-window [`RateLimiter`] with
//! adaptive backoff, and a [`RetryExecutor`] that honours `Retry-After`.
//! [`ApiClient::submit`] runs that pipeline inline; [`ApiClient::enqueue`]
//! hands the request to a single background worker that serves a
//! [`RequestQueue`] by priority.

pub mod api_client;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod executor;
pub mod queue;
pub mod rate_limit;
pub mod request;
pub mod retry_formatter;
pub mod stats;
pub mod transport;

pub use api_client::ApiClient;
pub use backoff::{AdaptiveBackoff, BackoffSnapshot};
pub use cache::{CacheStats, ResponseCache};
pub use config::ClientConfig;
pub use executor::{AttemptOutcome, RetryExecutor};
pub use queue::{QueuedRequest, RequestQueue, RequestTicket};
pub use rate_limit::{RateLimiter, RateWindow};
pub use request::{cache_key, ApiRequest, ApiResponse, Method, Priority};
pub use stats::{ClientStatistics, RequestStats};
pub use transport::{parse_retry_after, ReqwestTransport, Transport, TransportError};

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-retryable HTTP status (4xx other than 429)
    #[error("HTTP {status}: {body}")]
    Application {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Every attempt failed with a retryable error
    #[error("request failed after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Description of the final failure
        last_error: String,
    },

    /// A 2xx body was not valid JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration or environment
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The client was shut down before the request completed
    #[error("client is shut down")]
    Shutdown,
}

impl ClientError {
    /// Whether retries were exhausted (systemic trouble worth alerting on)
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Whether the request itself was refused (retrying will not help)
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Application { .. })
    }

    /// HTTP status of a permanent failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
