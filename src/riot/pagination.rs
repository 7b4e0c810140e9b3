//! Match id listing across pages and queues
//!
//! Match-V5 returns at most 100 ids per call. The helper walks `start`
//! offsets until the requested count is reached or a short page signals the
//! end of history. With several queue filters, queues are listed one after
//! another and share the same total budget.
//!
//! Includes safety mechanisms:
//! - Maximum iteration limit to prevent infinite loops
//! - Empty page detection

use std::collections::HashSet;
use std::future::Future;
use tracing::debug;

use super::{RiotError, RiotResult};

/// Largest page Match-V5 accepts
pub const PAGE_LIMIT: u32 = 100;

/// Maximum number of page requests per listing
pub const MAX_ITERATIONS: usize = 1_000;

/// Filters for a match id listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchIdQuery {
    /// Total ids wanted
    pub count: u32,
    /// Queue ids to include; empty means every queue
    pub queues: Vec<u16>,
    /// Inclusive lower bound, epoch seconds
    pub start_time: Option<i64>,
    /// Upper bound, epoch seconds
    pub end_time: Option<i64>,
}

impl MatchIdQuery {
    /// Query for the `count` most recent matches of any queue
    pub fn recent(count: u32) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    /// Restrict to the given queues
    pub fn with_queues(mut self, queues: impl IntoIterator<Item = u16>) -> Self {
        self.queues = queues.into_iter().collect();
        self
    }

    /// Restrict to a time range (epoch seconds)
    pub fn with_time_range(mut self, start_time: Option<i64>, end_time: Option<i64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }
}

/// One page to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Offset into the listing
    pub start: u32,
    /// Page size (1..=100)
    pub count: u32,
    /// Queue filter for this page
    pub queue: Option<u16>,
    /// Lower time bound
    pub start_time: Option<i64>,
    /// Upper time bound
    pub end_time: Option<i64>,
}

impl PageRequest {
    /// Query parameters in Match-V5 naming
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("start".to_string(), self.start.to_string()),
            ("count".to_string(), self.count.to_string()),
        ];
        if let Some(queue) = self.queue {
            params.push(("queue".to_string(), queue.to_string()));
        }
        if let Some(start_time) = self.start_time {
            params.push(("startTime".to_string(), start_time.to_string()));
        }
        if let Some(end_time) = self.end_time {
            params.push(("endTime".to_string(), end_time.to_string()));
        }
        params
    }
}

/// Collect up to `query.count` unique match ids using `fetch_page`.
///
/// Ids keep the order they were returned in; duplicates across queues are
/// dropped.
///
/// # Errors
/// Propagates `fetch_page` errors and fails with
/// [`RiotError::PaginationLimit`] after [`MAX_ITERATIONS`] pages.
pub async fn collect_match_ids<F, Fut>(query: &MatchIdQuery, mut fetch_page: F) -> RiotResult<Vec<String>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = RiotResult<Vec<String>>>,
{
    let queues: Vec<Option<u16>> = if query.queues.is_empty() {
        vec![None]
    } else {
        query.queues.iter().copied().map(Some).collect()
    };

    let mut ids = Vec::new();
    let mut remaining = query.count;
    let mut iteration = 0;

    'queues: for queue in queues {
        let mut start = 0;
        loop {
            let count = remaining.min(PAGE_LIMIT);
            if count == 0 {
                break 'queues;
            }

            if iteration >= MAX_ITERATIONS {
                return Err(RiotError::PaginationLimit(MAX_ITERATIONS));
            }
            iteration += 1;

            let page = PageRequest {
                start,
                count,
                queue,
                start_time: query.start_time,
                end_time: query.end_time,
            };
            let batch = fetch_page(page).await?;
            let len = u32::try_from(batch.len()).unwrap_or(u32::MAX);
            debug!(?queue, start, requested = count, received = len, "Fetched match id page");

            if batch.is_empty() {
                break;
            }
            ids.extend(batch);
            remaining = remaining.saturating_sub(len);
            start = start.saturating_add(len);

            if len < count {
                break;
            }
        }
    }

    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids.truncate(query.count as usize);
    Ok(ids)
}
