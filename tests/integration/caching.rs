//! Integration tests for response caching

use std::time::Duration;
use lol_match_exporter::client::{cache_key, ApiClient, ApiRequest, ResponseCache};
use serde_json::json;

use crate::support::{test_config, ScriptedTransport};

#[tokio::test(start_paused = true)]
async fn test_set_get_and_ttl_expiry() {
    let cache = ResponseCache::new(10);
    cache.set("k", json!({"v": 1}), Duration::from_secs(300));

    assert_eq!(cache.get("k"), Some(json!({"v": 1})));

    tokio::time::advance(Duration::from_secs(300)).await;
    assert!(cache.get("k").is_some(), "entry lives through its full TTL");

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(cache.get("k"), None);
    assert!(!cache.contains_key("k"));
}

#[tokio::test(start_paused = true)]
async fn test_lru_evicts_exactly_the_first_key() {
    let cache = ResponseCache::new(3);
    for key in ["a", "b", "c", "d"] {
        cache.set(key, key.to_string(), Duration::from_secs(60));
    }

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get("a"), None);
    for key in ["b", "c", "d"] {
        assert_eq!(cache.get(key).as_deref(), Some(key));
    }
}

#[tokio::test(start_paused = true)]
async fn test_submit_serves_repeat_get_from_cache() {
    let transport = ScriptedTransport::always(200, r#"{"puuid":"p-1"}"#);
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let request = ApiRequest::get(
        "https://europe.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Caps/EUW",
    );

    let first = client.submit(request.clone()).await.unwrap();
    let second = client.submit(request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.calls(), 1);

    let stats = client.get_statistics();
    assert_eq!(stats.cache.hits, 1);
    assert_eq!(stats.cache.misses, 1);
    assert_eq!(stats.cache.size, 1);
    assert_eq!(stats.total_requests, 1);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_param_order_does_not_split_cache_entries() {
    let transport = ScriptedTransport::always(200, r#"["EUW1_1"]"#);
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let url = "https://europe.api.riotgames.com/lol/match/v5/matches/by-puuid/p-1/ids";

    client
        .submit(ApiRequest::get(url).with_param("start", 0).with_param("count", 20))
        .await
        .unwrap();
    client
        .submit(ApiRequest::get(url).with_param("count", 20).with_param("start", 0))
        .await
        .unwrap();
    client
        .submit(ApiRequest::get(url).with_param("count", 20).with_param("start", 20))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 2);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_match_responses_expire_before_account_responses() {
    let transport = ScriptedTransport::always(200, "{}");
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let match_url = "https://europe.api.riotgames.com/lol/match/v5/matches/EUW1_1";
    let account_url =
        "https://europe.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Caps/EUW";

    client.submit(ApiRequest::get(match_url)).await.unwrap();
    client.submit(ApiRequest::get(account_url)).await.unwrap();

    // Match TTL is 5 minutes, everything else 10
    tokio::time::advance(Duration::from_secs(301)).await;
    assert!(client.cache().get(&cache_key(match_url, &[])).is_none());
    assert!(client.cache().get(&cache_key(account_url, &[])).is_some());
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_post_requests_bypass_cache() {
    let transport = ScriptedTransport::always(200, r#"{"accepted":true}"#);
    let client = ApiClient::with_transport(test_config(), transport.clone()).unwrap();
    let request = ApiRequest::post("https://europe.api.riotgames.com/lol/tournament-stub/v5/codes");

    client.submit(request.clone()).await.unwrap();
    client.submit(request).await.unwrap();

    assert_eq!(transport.calls(), 2);
    assert!(client.cache().is_empty());
    client.shutdown().await;
}
