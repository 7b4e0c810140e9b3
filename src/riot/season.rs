//! Ranked season boundaries and time-range segmentation
//!
//! Match-V5 filters by `startTime`/`endTime` in epoch seconds. Long ranges
//! are split into segments so each listing stays well under the pagination
//! ceiling.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Longest segment produced by [`segment_time_range`], in days.
pub const MAX_SEGMENT_DAYS: i64 = 30;

/// Known season bounds (year, start, end) as calendar dates in UTC.
const SEASONS: [(i32, (i32, u32, u32), (i32, u32, u32)); 4] = [
    (2024, (2024, 1, 10), (2024, 12, 31)),
    (2023, (2023, 1, 11), (2023, 11, 20)),
    (2022, (2022, 1, 7), (2022, 11, 14)),
    (2021, (2021, 1, 8), (2021, 11, 15)),
];

fn midnight_utc((year, month, day): (i32, u32, u32)) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
}

/// Season bounds as `(start, end)` epoch seconds, or `None` if unknown.
pub fn season_bounds(season: i32) -> Option<(i64, i64)> {
    let (_, start, end) = SEASONS.iter().find(|(year, _, _)| *year == season)?;
    Some((midnight_utc(*start)?, midnight_utc(*end)?))
}

/// Seasons with known bounds, newest first
pub fn known_seasons() -> Vec<i32> {
    SEASONS.iter().map(|(year, _, _)| *year).collect()
}

/// Season containing `now`, falling back to the calendar year.
pub fn current_season(now: DateTime<Utc>) -> i32 {
    let ts = now.timestamp();
    known_seasons()
        .into_iter()
        .find(|season| {
            season_bounds(*season).is_some_and(|(start, end)| start <= ts && ts <= end)
        })
        .unwrap_or_else(|| now.year())
}

/// Split `[start, end)` (epoch seconds) into consecutive segments of at most
/// `max_days` days. Returns nothing when `start >= end`.
pub fn segment_time_range(start: i64, end: i64, max_days: i64) -> Vec<(i64, i64)> {
    let step = max_days.max(1) * 24 * 60 * 60;
    let mut segments = Vec::new();
    let mut current = start;
    while current < end {
        let segment_end = current.saturating_add(step).min(end);
        segments.push((current, segment_end));
        current = segment_end;
    }
    segments
}
