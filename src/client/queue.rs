//! Priority request queue and its background worker
//!
//! Entries are served highest priority first and FIFO within a priority.
//! A request that fails with 429, 5xx or a transport error is re-enqueued at
//! the tail of the HIGH class until it runs out of requeues.

use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::api_client::ClientCore;
use super::config::calculate_backoff;
use super::executor::AttemptOutcome;
use super::request::{ApiRequest, Method, Priority};
use super::{ClientError, ClientResult};
use crate::metrics::{record_queue_depth, record_request_dropped};
use crate::shutdown::SharedShutdown;

type Responder = oneshot::Sender<ClientResult<Value>>;

/// A request waiting in the queue.
#[derive(Debug)]
pub struct QueuedRequest {
    /// The request to perform; its priority is raised to HIGH on requeue
    pub request: ApiRequest,
    /// When the request was first enqueued
    pub enqueued_at: Instant,
    /// Arrival order, reassigned on every push
    pub sequence: u64,
    /// How many times this request has been re-enqueued
    pub retry_count: u32,
    responder: Option<Responder>,
}

impl QueuedRequest {
    /// Fire-and-forget entry with no result delivery
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            enqueued_at: Instant::now(),
            sequence: 0,
            retry_count: 0,
            responder: None,
        }
    }

    /// Entry paired with a ticket that receives the result
    pub fn with_ticket(request: ApiRequest) -> (Self, RequestTicket) {
        let (tx, rx) = oneshot::channel();
        let mut entry = Self::new(request);
        entry.responder = Some(tx);
        (entry, RequestTicket { rx })
    }

    /// Current priority
    pub fn priority(&self) -> Priority {
        self.request.priority
    }

    fn respond(mut self, result: ClientResult<Value>) {
        if let Some(tx) = self.responder.take() {
            // The caller may have dropped its ticket.
            let _ = tx.send(result);
        }
    }
}

impl PartialEq for QueuedRequest {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for QueuedRequest {}

impl PartialOrd for QueuedRequest {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedRequest {
    // BinaryHeap pops the greatest element: higher priority (lower `Priority`)
    // and then lower sequence must compare greater.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .priority()
            .cmp(&self.priority())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Handle to the eventual result of an enqueued request.
///
/// Dropping the ticket turns the request into fire-and-forget.
#[derive(Debug)]
pub struct RequestTicket {
    rx: oneshot::Receiver<ClientResult<Value>>,
}

impl RequestTicket {
    /// Wait for the worker to finish the request.
    ///
    /// Resolves to [`ClientError::Shutdown`] if the client stops first.
    pub async fn wait(self) -> ClientResult<Value> {
        self.rx.await.unwrap_or(Err(ClientError::Shutdown))
    }
}

/// Thread-safe priority queue with async wake-up.
#[derive(Debug, Default)]
pub struct RequestQueue {
    heap: Mutex<BinaryHeap<QueuedRequest>>,
    notify: Notify,
    sequence: AtomicU64,
}

impl RequestQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BinaryHeap<QueuedRequest>> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an entry behind everything of equal or higher priority.
    pub fn push(&self, mut entry: QueuedRequest) {
        entry.sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let depth = {
            let mut heap = self.lock();
            heap.push(entry);
            heap.len()
        };
        record_queue_depth(depth);
        self.notify.notify_one();
    }

    /// Remove the next entry if any.
    pub fn pop(&self) -> Option<QueuedRequest> {
        let mut heap = self.lock();
        let entry = heap.pop();
        record_queue_depth(heap.len());
        entry
    }

    /// Wait for and remove the next entry.
    pub async fn next(&self) -> QueuedRequest {
        loop {
            if let Some(entry) = self.pop() {
                return entry;
            }
            self.notify.notified().await;
        }
    }

    /// Remove every pending entry.
    pub fn drain(&self) -> Vec<QueuedRequest> {
        let drained: Vec<QueuedRequest> = self.lock().drain().collect();
        record_queue_depth(0);
        drained
    }

    /// Pending entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Serve queued requests until shutdown.
///
/// Request failures are delivered to the caller's ticket; they never stop the
/// loop. Entries still pending at shutdown are dropped, which resolves their
/// tickets with [`ClientError::Shutdown`].
pub(crate) async fn run_worker(core: Arc<ClientCore>, shutdown: SharedShutdown) {
    info!("Request queue worker started");

    loop {
        let entry = tokio::select! {
            _ = shutdown.wait_for_shutdown() => break,
            entry = core.queue.next() => entry,
        };

        tokio::select! {
            _ = shutdown.wait_for_shutdown() => break,
            _ = process(&core, entry) => {}
        }
    }

    let pending = core.queue.drain().len();
    info!(pending, "Request queue worker stopped");
}

async fn process(core: &ClientCore, entry: QueuedRequest) {
    let cacheable = entry.request.method == Method::Get;
    let key = entry.request.cache_key();

    if cacheable {
        if let Some(value) = core.cache.get(&key) {
            debug!(endpoint = entry.request.endpoint(), "Queued request served from cache");
            entry.respond(Ok(value));
            return;
        }
    }

    match core.executor.attempt(&entry.request).await {
        AttemptOutcome::Success(response) => match response.json() {
            Ok(value) => {
                if cacheable {
                    let ttl = core.config.ttl_for(&entry.request.url);
                    core.cache.set(key, value.clone(), ttl);
                }
                entry.respond(Ok(value));
            }
            Err(e) => {
                let message = format!("invalid JSON from {}: {e}", entry.request.endpoint());
                entry.respond(Err(ClientError::Parse(message)));
            }
        },
        AttemptOutcome::RateLimited { retry_after } => {
            warn!(
                endpoint = entry.request.endpoint(),
                retry_count = entry.retry_count,
                "Queued request rate limited"
            );
            let delay = retry_after.unwrap_or_else(|| calculate_backoff(entry.retry_count));
            requeue_after(core, entry, delay, "HTTP 429 Too Many Requests".to_string()).await;
        }
        AttemptOutcome::ServerError { status } => {
            warn!(
                endpoint = entry.request.endpoint(),
                status,
                retry_count = entry.retry_count,
                "Queued request hit a server error"
            );
            let delay = calculate_backoff(entry.retry_count);
            requeue_after(core, entry, delay, format!("HTTP {status}")).await;
        }
        AttemptOutcome::Transport(err) => {
            warn!(
                endpoint = entry.request.endpoint(),
                error = %err,
                retry_count = entry.retry_count,
                "Queued request failed in transport"
            );
            let delay = calculate_backoff(entry.retry_count);
            requeue_after(core, entry, delay, err.to_string()).await;
        }
        AttemptOutcome::Rejected { status, body } => {
            entry.respond(Err(ClientError::Application { status, body }));
        }
    }
}

/// Sleep `delay` and re-enqueue at HIGH, or drop at once when the entry has
/// no requeues left.
async fn requeue_after(
    core: &ClientCore,
    mut entry: QueuedRequest,
    delay: Duration,
    last_error: String,
) {
    if entry.retry_count >= core.config.max_requeues {
        drop_exhausted(core, entry, last_error);
        return;
    }

    debug!(
        endpoint = entry.request.endpoint(),
        delay_ms = delay.as_millis(),
        "Waiting before requeue"
    );
    sleep(delay).await;

    entry.retry_count += 1;
    entry.request.priority = Priority::High;
    debug!(
        endpoint = entry.request.endpoint(),
        retry_count = entry.retry_count,
        "Re-enqueued request at high priority"
    );
    core.queue.push(entry);
}

fn drop_exhausted(core: &ClientCore, entry: QueuedRequest, last_error: String) {
    core.stats.record_dropped();
    record_request_dropped(&entry.request.endpoint_label());
    error!(
        endpoint = entry.request.endpoint(),
        retries = entry.retry_count,
        queued_for_ms = entry.enqueued_at.elapsed().as_millis(),
        last_error = %last_error,
        "Dropping request after exhausting requeues"
    );
    let attempts = entry.retry_count + 1;
    entry.respond(Err(ClientError::Exhausted {
        attempts,
        last_error,
    }));
}
