//! The client façade owning limiter, cache, queue, executor and worker

use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cache::ResponseCache;
use super::config::ClientConfig;
use super::executor::RetryExecutor;
use super::queue::{run_worker, QueuedRequest, RequestQueue, RequestTicket};
use super::rate_limit::RateLimiter;
use super::request::{ApiRequest, Method};
use super::stats::{ClientStatistics, RequestStats};
use super::transport::{ReqwestTransport, Transport};
use super::{ClientError, ClientResult};
use crate::shutdown::{SharedShutdown, ShutdownCoordinator};

/// State shared between the client and its worker task.
#[derive(Debug)]
pub(crate) struct ClientCore {
    pub(crate) config: ClientConfig,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) cache: ResponseCache<Value>,
    pub(crate) queue: RequestQueue,
    pub(crate) executor: RetryExecutor,
    pub(crate) stats: Arc<RequestStats>,
}

/// Rate-limited, cached, retrying Riot API client.
///
/// Creating a client spawns one background worker on the current Tokio
/// runtime to serve [`enqueue`](Self::enqueue)d requests. The worker stops on
/// [`shutdown`](Self::shutdown) or when the client is dropped.
///
/// # Example
///
/// ```no_run
/// use lol_match_exporter::client::{ApiClient, ApiRequest, ClientConfig, Priority};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(ClientConfig::default(), "RGAPI-...")?;
///
/// let account = client
///     .submit(ApiRequest::get(
///         "https://europe.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Name/TAG",
///     ))
///     .await?;
///
/// let ticket = client.enqueue(
///     ApiRequest::get("https://europe.api.riotgames.com/lol/match/v5/matches/EUW1_1")
///         .with_priority(Priority::Low),
/// )?;
/// let _match = ticket.wait().await?;
///
/// println!("{}", client.get_statistics());
/// client.shutdown().await;
/// # let _ = account;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiClient {
    core: Arc<ClientCore>,
    shutdown: SharedShutdown,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ApiClient {
    /// Create a client sending requests over HTTPS with `api_key`.
    ///
    /// # Errors
    /// [`ClientError::Configuration`] for an invalid configuration or key, or
    /// when called outside a Tokio runtime.
    pub fn new(config: ClientConfig, api_key: &str) -> ClientResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config, api_key)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> ClientResult<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| {
            ClientError::Configuration("ApiClient must be created inside a Tokio runtime".to_string())
        })?;

        let limiter = Arc::new(RateLimiter::from_config(&config));
        let stats = Arc::new(RequestStats::new());
        let executor = RetryExecutor::new(
            transport,
            Arc::clone(&limiter),
            Arc::clone(&stats),
            config.max_attempts,
        );

        info!(
            short_limit = config.short_limit,
            short_window_ms = config.short_window.as_millis(),
            long_limit = config.long_limit,
            long_window_ms = config.long_window.as_millis(),
            cache_capacity = config.cache_capacity,
            "Creating API client"
        );

        let core = Arc::new(ClientCore {
            cache: ResponseCache::new(config.cache_capacity),
            queue: RequestQueue::new(),
            config,
            limiter,
            executor,
            stats,
        });

        let shutdown = ShutdownCoordinator::shared();
        let worker = runtime.spawn(run_worker(Arc::clone(&core), Arc::clone(&shutdown)));

        Ok(Self {
            core,
            shutdown,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Perform `request` now, bypassing the queue.
    ///
    /// GET responses are served from and stored in the cache. Misses go
    /// through the rate limiter and the retry executor.
    ///
    /// # Errors
    /// [`ClientError::Application`] for permanent HTTP errors,
    /// [`ClientError::Exhausted`] when every attempt failed, and
    /// [`ClientError::Parse`] when a 2xx body is not JSON.
    pub async fn submit(&self, request: ApiRequest) -> ClientResult<Value> {
        if self.shutdown.is_shutdown_requested() {
            return Err(ClientError::Shutdown);
        }

        let cacheable = request.method == Method::Get;
        let key = request.cache_key();
        if cacheable {
            if let Some(value) = self.core.cache.get(&key) {
                debug!(endpoint = request.endpoint(), "Cache hit");
                return Ok(value);
            }
        }

        let response = self.core.executor.execute(&request).await?;
        let value = response.json().map_err(|e| {
            ClientError::Parse(format!("invalid JSON from {}: {e}", request.endpoint()))
        })?;

        if cacheable {
            let ttl = self.core.config.ttl_for(&request.url);
            self.core.cache.set(key, value.clone(), ttl);
        }
        Ok(value)
    }

    /// Hand `request` to the background worker.
    ///
    /// Returns immediately. Await the ticket for the result or drop it for
    /// fire-and-forget prefetching.
    pub fn enqueue(&self, request: ApiRequest) -> ClientResult<RequestTicket> {
        if self.shutdown.is_shutdown_requested() {
            return Err(ClientError::Shutdown);
        }
        let (entry, ticket) = QueuedRequest::with_ticket(request);
        self.core.queue.push(entry);
        Ok(ticket)
    }

    /// Snapshot of counters, cache, queue and backoff state
    pub fn get_statistics(&self) -> ClientStatistics {
        self.core.stats.snapshot(
            self.core.cache.stats(),
            self.core.queue.len(),
            self.core.limiter.backoff_snapshot(),
        )
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Pending tickets resolve to [`ClientError::Shutdown`]. Idempotent.
    pub async fn shutdown(&self) {
        self.shutdown.request_shutdown();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                warn!(error = %e, "Request queue worker ended abnormally");
            }
        }
    }

    /// Whether shutdown has been requested
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }

    /// The response cache
    pub fn cache(&self) -> &ResponseCache<Value> {
        &self.core.cache
    }

    /// The rate limiter
    pub fn limiter(&self) -> &RateLimiter {
        &self.core.limiter
    }

    /// The active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.core.config
    }
}

impl Drop for ApiClient {
    fn drop(&mut self) {
        self.shutdown.request_shutdown();
    }
}
