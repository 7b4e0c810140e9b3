//! Integration tests for retries through the client's direct path

use std::sync::Arc;
use std::time::Duration;
use lol_match_exporter::client::{
    ApiClient, ApiRequest, ApiResponse, ClientError, RateLimiter, RequestStats, RetryExecutor,
    TransportError,
};
use tokio::time::Instant;

use crate::support::{test_config, ScriptedTransport};

const MATCH_URL: &str = "https://europe.api.riotgames.com/lol/match/v5/matches/EUW1_1";

#[tokio::test(start_paused = true)]
async fn test_persistent_server_errors_stop_after_max_attempts() {
    let transport = ScriptedTransport::always(500, "boom");
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let t0 = Instant::now();

    let err = client.submit(ApiRequest::get(MATCH_URL)).await.unwrap_err();

    assert_eq!(transport.calls(), 6);
    match err {
        ClientError::Exhausted { attempts, last_error } => {
            assert_eq!(attempts, 6);
            assert_eq!(last_error, "HTTP 500");
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    // 1 + 2 + 4 + 8 + 16, no sleep after the last attempt
    assert_eq!(t0.elapsed(), Duration::from_secs(31));
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_is_honoured() {
    let transport = ScriptedTransport::new(vec![
        Ok(ApiResponse::new(429, "").with_retry_after("2")),
        Ok(ApiResponse::new(429, "").with_retry_after("2")),
        Ok(ApiResponse::new(200, r#"{"metadata":{"matchId":"EUW1_1"}}"#)),
    ]);
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let t0 = Instant::now();

    let value = client.submit(ApiRequest::get(MATCH_URL)).await.unwrap();

    assert_eq!(value["metadata"]["matchId"], "EUW1_1");
    assert_eq!(transport.calls(), 3);
    assert_eq!(t0.elapsed(), Duration::from_secs(4));

    let times = transport.call_times();
    assert_eq!(times[1] - times[0], Duration::from_secs(2));
    assert_eq!(times[2] - times[1], Duration::from_secs(2));

    let stats = client.get_statistics();
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.rate_limited_requests, 2);
    assert_eq!(stats.backoff.consecutive_failures, 2);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_429_without_retry_after_uses_exponential_delay() {
    let transport = ScriptedTransport::new(vec![
        Ok(ApiResponse::new(429, "")),
        Ok(ApiResponse::new(503, "")),
        Ok(ApiResponse::new(200, "[]")),
    ]);
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let t0 = Instant::now();

    client.submit(ApiRequest::get(MATCH_URL)).await.unwrap();

    assert_eq!(t0.elapsed(), Duration::from_secs(3));
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_retry_after_falls_back_to_backoff() {
    let transport = ScriptedTransport::new(vec![
        Ok(ApiResponse::new(429, "").with_retry_after("1e20")),
        Ok(ApiResponse::new(200, "[]")),
    ]);
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let t0 = Instant::now();

    client.submit(ApiRequest::get(MATCH_URL)).await.unwrap();

    assert_eq!(transport.calls(), 2);
    assert_eq!(t0.elapsed(), Duration::from_secs(1));
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_permanent_errors_are_not_retried() {
    let transport = ScriptedTransport::always(403, "Forbidden");
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();

    let err = client.submit(ApiRequest::get(MATCH_URL)).await.unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert!(err.is_permanent());
    assert!(!err.is_exhaustion());
    assert_eq!(err.status(), Some(403));
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_are_retried() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::Timeout("request timed out".into())),
        Err(TransportError::Connect("connection refused".into())),
        Ok(ApiResponse::new(200, r#"{"ok":true}"#)),
    ]);
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();

    let value = client.submit(ApiRequest::get(MATCH_URL)).await.unwrap();

    assert_eq!(value["ok"], true);
    assert_eq!(transport.calls(), 3);
    assert_eq!(client.get_statistics().failed_requests, 2);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_invalid_json_is_a_parse_error() {
    let transport = ScriptedTransport::always(200, "<html>maintenance</html>");
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();

    let err = client.submit(ApiRequest::get(MATCH_URL)).await.unwrap_err();

    assert!(matches!(err, ClientError::Parse(_)));
    assert_eq!(transport.calls(), 1);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_executor_with_custom_attempt_budget() {
    let transport = ScriptedTransport::always(502, "bad gateway");
    let limiter = Arc::new(RateLimiter::new(
        20,
        Duration::from_secs(1),
        100,
        Duration::from_secs(120),
        0.1,
    ));
    let stats = Arc::new(RequestStats::new());
    let executor = RetryExecutor::new(transport.clone(), limiter, Arc::clone(&stats), 3);

    let err = executor.execute(&ApiRequest::get(MATCH_URL)).await.unwrap_err();

    assert!(matches!(err, ClientError::Exhausted { attempts: 3, .. }));
    assert_eq!(transport.calls(), 3);
    assert_eq!(stats.total(), 3);
    assert_eq!(stats.failed(), 3);
}
