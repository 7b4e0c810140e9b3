//! Retry message formatting for Riot API calls.
//!
//! Classifies failures into user-facing categories and renders consistent
//! retry, recovery and final-failure messages for the logs.

use std::time::Duration;

use super::transport::TransportError;

/// Classification of retry errors for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Network timeout
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// HTTP 429 rate limit exceeded
    RateLimit,
    /// HTTP 5xx server error
    ServerError(u16),
    /// HTTP 400 invalid request
    InvalidRequest,
    /// Authentication failures (401/403), usually an expired key
    AuthFailed(u16),
    /// HTTP 404, e.g. unknown Riot ID or match
    NotFound,
    /// Other client errors (4xx, except 429)
    ClientError(u16),
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl RetryErrorType {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidRequest,
            401 | 403 => Self::AuthFailed(status),
            404 => Self::NotFound,
            429 => Self::RateLimit,
            500..=599 => Self::ServerError(status),
            400..=499 => Self::ClientError(status),
            _ => Self::NetworkGeneric,
        }
    }

    /// Classify a transport failure.
    pub fn from_transport(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => Self::NetworkTimeout,
            TransportError::Connect(_) => Self::NetworkOffline,
            TransportError::Other(_) => Self::NetworkGeneric,
        }
    }

    /// User-friendly description string used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::InvalidRequest => "invalid request",
            Self::AuthFailed(code) => match code {
                401 => "authentication failed (401)",
                403 => "forbidden (403)",
                _ => "authentication failed",
            },
            Self::NotFound => "resource not found",
            Self::ClientError(_) => "client error",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Suggested remediation shown after the final failure.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Check your network connection and firewall settings",
            Self::NetworkOffline => "Verify internet connectivity and DNS resolution",
            Self::RateLimit => "Lower --concurrency or use a production API key with a higher quota",
            Self::ServerError(_) => "Riot services may be degraded, check https://status.riotgames.com",
            Self::InvalidRequest => "Check the Riot ID, queue ids and time range arguments",
            Self::AuthFailed(_) => "Development keys expire every 24 hours; regenerate RIOT_API_KEY",
            Self::NotFound => "Verify the Riot ID and --platform match the player's region",
            Self::ClientError(_) => "Review request parameters against the Riot API reference",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }

    /// Whether the error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidRequest | Self::AuthFailed(_) | Self::NotFound | Self::ClientError(_)
        )
    }
}

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Type of error that triggered the retry
    pub error_type: RetryErrorType,
    /// Delay before the next attempt
    pub backoff_duration: Duration,
    /// Endpoint path that failed
    pub endpoint: String,
    /// Original error message
    pub error_message: String,
}

impl RetryContext {
    /// Build a context for one failed attempt
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error_type: RetryErrorType,
        backoff_duration: Duration,
        endpoint: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error_type,
            backoff_duration,
            endpoint: endpoint.into(),
            error_message: error_message.into(),
        }
    }

    /// Standard retry line with attempt counters and wait time.
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds... ({})",
            self.attempt,
            self.max_attempts,
            self.error_type.description(),
            self.backoff_duration.as_secs_f64(),
            self.endpoint
        )
    }

    /// Line logged when an attempt succeeds after earlier failures.
    pub fn format_success(&self) -> String {
        format!(
            "Retry attempt {}/{} succeeded ({})",
            self.attempt, self.max_attempts, self.endpoint
        )
    }

    /// Multi-line failure summary with suggestions.
    pub fn format_failure(&self) -> String {
        let mut lines = vec![
            format!("[FAILED] Request failed after {} attempts", self.attempt),
            format!("  Last error: {}", self.error_message),
            format!("  Endpoint: {}", self.endpoint),
            "  Suggestions:".to_string(),
        ];
        for suggestion in self.format_suggestions() {
            lines.push(format!("    - {suggestion}"));
        }
        lines.join("\n")
    }

    /// Suggestions tailored to the failure.
    pub fn format_suggestions(&self) -> Vec<String> {
        let mut suggestions = vec![self.error_type.suggestion().to_string()];
        if self.error_type.is_retryable() {
            suggestions.push(format!(
                "Try increasing --max-attempts (current: {})",
                self.max_attempts
            ));
        }
        suggestions
    }
}
