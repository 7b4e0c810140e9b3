//! Integration tests for the dual-window rate limiter

use std::sync::{Arc, Mutex};
use std::time::Duration;
use lol_match_exporter::client::{Priority, RateLimiter};
use tokio::time::Instant;

/// Requests admitted in any sliding `window` ending at an admission.
fn max_in_any_window(stamps: &[Instant], window: Duration) -> usize {
    stamps
        .iter()
        .map(|&end| {
            stamps
                .iter()
                .filter(|&&t| t <= end && end.duration_since(t) < window)
                .count()
        })
        .max()
        .unwrap_or(0)
}

#[tokio::test(start_paused = true)]
async fn test_short_window_never_exceeded() {
    let limiter = RateLimiter::new(5, Duration::from_secs(1), 1000, Duration::from_secs(120), 0.1);

    let mut stamps = Vec::new();
    for _ in 0..23 {
        limiter.acquire(Priority::Normal).await;
        stamps.push(Instant::now());
    }

    assert_eq!(max_in_any_window(&stamps, Duration::from_secs(1)), 5);
    assert!(limiter.in_flight().0 <= 5);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_tasks_never_exceed_window() {
    let limiter = Arc::new(RateLimiter::new(
        4,
        Duration::from_secs(1),
        1000,
        Duration::from_secs(120),
        0.0,
    ));
    let stamps = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..30)
        .map(|i| {
            let limiter = Arc::clone(&limiter);
            let stamps = Arc::clone(&stamps);
            let priority = match i % 3 {
                0 => Priority::High,
                1 => Priority::Normal,
                _ => Priority::Low,
            };
            tokio::spawn(async move {
                limiter.acquire(priority).await;
                stamps.lock().unwrap().push(Instant::now());
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 30);
    assert!(max_in_any_window(&stamps, Duration::from_secs(1)) <= 4);
}

#[tokio::test(start_paused = true)]
async fn test_development_key_quota_scenario() {
    // 20 per second and 100 per two minutes
    let limiter = RateLimiter::new(20, Duration::from_secs(1), 100, Duration::from_secs(120), 0.1);
    let t0 = Instant::now();

    let mut elapsed = Vec::new();
    for _ in 0..25 {
        limiter.acquire(Priority::Normal).await;
        elapsed.push(t0.elapsed());
    }

    for (i, e) in elapsed.iter().enumerate().take(20) {
        assert_eq!(*e, Duration::ZERO, "request {} should not wait", i + 1);
    }
    for (i, e) in elapsed.iter().enumerate().skip(20) {
        assert!(*e >= Duration::from_secs(1), "request {} admitted after {:?}", i + 1, e);
        assert!(*e < Duration::from_secs(2), "request {} admitted after {:?}", i + 1, e);
    }
    assert_eq!(limiter.in_flight().1, 25);
}

#[tokio::test(start_paused = true)]
async fn test_long_window_blocks_after_its_limit() {
    let limiter = RateLimiter::new(100, Duration::from_secs(1), 10, Duration::from_secs(120), 0.1);
    let t0 = Instant::now();

    for _ in 0..10 {
        limiter.acquire(Priority::High).await;
    }
    assert_eq!(t0.elapsed(), Duration::ZERO);

    // Burst allowance never extends the long window
    let waited = limiter.acquire(Priority::High).await;
    assert!(waited >= Duration::from_secs(120));
    assert!(t0.elapsed() >= Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn test_high_priority_gets_short_window_burst() {
    let limiter = RateLimiter::new(20, Duration::from_secs(1), 100, Duration::from_secs(120), 0.1);
    let t0 = Instant::now();

    for _ in 0..22 {
        limiter.acquire(Priority::High).await;
    }
    assert_eq!(t0.elapsed(), Duration::ZERO);

    limiter.acquire(Priority::High).await;
    assert!(t0.elapsed() >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_throttling_halves_capacity_at_most() {
    let limiter = RateLimiter::new(20, Duration::from_secs(1), 100, Duration::from_secs(120), 0.0);
    for _ in 0..10 {
        limiter.report_failure();
    }

    let t0 = Instant::now();
    for _ in 0..10 {
        limiter.acquire(Priority::Normal).await;
    }
    assert_eq!(t0.elapsed(), Duration::ZERO);

    limiter.acquire(Priority::Normal).await;
    assert!(t0.elapsed() >= Duration::from_secs(1));

    let snapshot = limiter.backoff_snapshot();
    assert_eq!(snapshot.consecutive_failures, 10);
    assert!((snapshot.multiplier - 2.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_resets_after_quiet_minute() {
    let limiter = RateLimiter::new(20, Duration::from_secs(1), 100, Duration::from_secs(120), 0.0);
    limiter.report_failure();
    limiter.report_failure();

    tokio::time::advance(Duration::from_secs(61)).await;
    limiter.report_failure();

    assert_eq!(limiter.backoff_snapshot().consecutive_failures, 1);
}
