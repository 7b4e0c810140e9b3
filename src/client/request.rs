//! Request and response types shared by the direct and queued paths

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Request priority. `High` sorts before `Normal`, which sorts before `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Served first; gets the short-window burst allowance
    High,
    /// Default priority
    #[default]
    Normal,
    /// Background work such as prefetching
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Normal => write!(f, "normal"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A single API call as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Absolute URL without query string
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// Query parameters, in caller order
    pub params: Vec<(String, String)>,
    /// Extra headers on top of the client defaults
    pub headers: Vec<(String, String)>,
    /// Scheduling priority
    pub priority: Priority,
}

impl ApiRequest {
    /// GET request for `url` at normal priority
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            params: Vec::new(),
            headers: Vec::new(),
            priority: Priority::Normal,
        }
    }

    /// POST request for `url` at normal priority
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    /// Append a query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Cache key for this request, see [`cache_key`].
    pub fn cache_key(&self) -> String {
        cache_key(&self.url, &self.params)
    }

    /// URL path without scheme and host, used in log messages.
    pub fn endpoint(&self) -> &str {
        let without_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        match without_scheme.find('/') {
            Some(idx) => &without_scheme[idx..],
            None => "/",
        }
    }

    /// Bounded metrics label: the first four path segments of the endpoint.
    ///
    /// Riot paths put identifiers after `/{game}/{service}/{version}/{resource}`,
    /// so this keeps puuids and match ids out of label values.
    pub fn endpoint_label(&self) -> String {
        let segments: Vec<&str> = self
            .endpoint()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .take(4)
            .collect();
        format!("/{}", segments.join("/"))
    }
}

/// Deterministic cache key for a URL and its query parameters.
///
/// Parameters are sorted by key, then value, so two requests that differ only
/// in parameter insertion order share a key. The canonical form is hashed with
/// SHA-256 and returned as lowercase hex.
pub fn cache_key(url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let canonical = serde_json::to_string(&sorted).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Raw HTTP response as seen by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw `Retry-After` header value, if present
    pub retry_after: Option<String>,
    /// Response body text
    pub body: String,
}

impl ApiResponse {
    /// Response with the given status and body and no `Retry-After`
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    /// Attach a `Retry-After` header value
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
