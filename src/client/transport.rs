//! HTTP transport seam
//!
//! The executor talks to the network only through [`Transport`], so tests can
//! script responses without a server. [`ReqwestTransport`] is the production
//! implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::request::{ApiRequest, ApiResponse, Method};
use super::{ClientError, ClientResult};

/// Header carrying the Riot API key
pub const RIOT_TOKEN_HEADER: &str = "X-Riot-Token";

/// Failure to obtain any HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The call exceeded its timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, DNS failure or TLS failure
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending or reading the body
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Sends one HTTP request and returns the raw response.
///
/// Implementations must not retry or rate limit; both are the executor's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single HTTP call
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client carrying the API key and user agent as default headers.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if the key is not a valid header
    /// value or the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig, api_key: &str) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(api_key).map_err(|e| {
            ClientError::Configuration(format!("API key is not a valid header value: {e}"))
        })?;
        token.set_sensitive(true);
        headers.insert(RIOT_TOKEN_HEADER, token);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| {
                ClientError::Configuration(format!("invalid user agent: {e}"))
            })?,
        );

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(method = %request.method, url = %request.url, params = request.params.len(), "Sending HTTP request");

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(ApiResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Parse a `Retry-After` header value.
///
/// Accepts delay-seconds (fractions allowed) or an HTTP-date, which is
/// converted to the time remaining from now (zero if already past).
/// Returns `None` for anything else.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        return match Duration::try_from_secs_f64(seconds) {
            Ok(delay) => Some(delay),
            Err(_) => {
                warn!(value, "Ignoring negative, non-finite or out-of-range Retry-After");
                None
            }
        };
    }

    match DateTime::parse_from_rfc2822(value) {
        Ok(date) => {
            let remaining = date.with_timezone(&Utc) - Utc::now();
            Some(remaining.to_std().unwrap_or(Duration::ZERO))
        }
        Err(_) => {
            warn!(value, "Unparseable Retry-After header");
            None
        }
    }
}
