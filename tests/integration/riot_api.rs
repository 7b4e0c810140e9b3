//! Integration tests for the Riot API layer over a routed fake transport

use std::sync::Arc;
use std::time::Duration;
use lol_match_exporter::client::ApiClient;
use lol_match_exporter::riot::pagination::MatchIdQuery;
use lol_match_exporter::riot::{RankedEntry, RiotApi, RiotError};
use lol_match_exporter::RiotId;

use crate::support::{match_json, test_config, RouteTransport};

fn api(transport: Arc<RouteTransport>, platform: &str) -> RiotApi {
    let client = ApiClient::with_transport(test_config(), transport).unwrap();
    RiotApi::new(Arc::new(client), platform).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_resolves_riot_id_on_account_cluster() {
    let transport = Arc::new(
        RouteTransport::new().route("/accounts/by-riot-id/", 200, r#"{"puuid":"p-faker","gameName":"Hide on bush","tagLine":"KR1"}"#),
    );
    let api = api(Arc::clone(&transport), "kr");

    let puuid = api
        .puuid_by_riot_id(&RiotId::parse("Hide on bush#kr1").unwrap())
        .await
        .unwrap();

    assert_eq!(puuid, "p-faker");
    assert_eq!(
        transport.requests()[0].url,
        "https://asia.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Hide%20on%20bush/KR1"
    );
}

#[tokio::test(start_paused = true)]
async fn test_account_without_puuid_is_an_error() {
    let transport = Arc::new(RouteTransport::new().route("/accounts/by-riot-id/", 200, "{}"));
    let api = api(transport, "euw1");

    let err = api
        .puuid_by_riot_id(&RiotId::parse("Caps#EUW").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RiotError::MissingField("puuid")));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_account_is_not_found() {
    let transport = Arc::new(RouteTransport::new());
    let api = api(transport, "euw1");

    let err = api
        .puuid_by_riot_id(&RiotId::parse("Nobody#0000").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_match_ids_use_match_cluster_and_params() {
    let transport = Arc::new(RouteTransport::new().route(
        "/by-puuid/p-1/ids",
        200,
        r#"["OC1_3","OC1_2","OC1_1"]"#,
    ));
    let api = api(Arc::clone(&transport), "oc1");

    let query = MatchIdQuery::recent(20)
        .with_queues([420])
        .with_time_range(Some(1_700_000_000), None);
    let ids = api.match_ids("p-1", &query).await.unwrap();

    assert_eq!(ids, vec!["OC1_3", "OC1_2", "OC1_1"]);
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        "https://sea.api.riotgames.com/lol/match/v5/matches/by-puuid/p-1/ids"
    );
    let param = |name: &str| {
        requests[0]
            .params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    assert_eq!(param("start").as_deref(), Some("0"));
    assert_eq!(param("count").as_deref(), Some("20"));
    assert_eq!(param("queue").as_deref(), Some("420"));
    assert_eq!(param("startTime").as_deref(), Some("1700000000"));
    assert_eq!(param("endTime"), None);
}

#[tokio::test(start_paused = true)]
async fn test_multiple_queues_dedup_ids() {
    let transport = Arc::new(RouteTransport::new().route(
        "/ids",
        200,
        r#"["EUW1_2","EUW1_1"]"#,
    ));
    let api = api(Arc::clone(&transport), "euw1");

    let query = MatchIdQuery::recent(10).with_queues([420, 440]);
    let ids = api.match_ids("p-1", &query).await.unwrap();

    assert_eq!(ids, vec!["EUW1_2", "EUW1_1"]);
    assert_eq!(transport.count("/ids"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_season_listing_walks_segments() {
    let transport = Arc::new(RouteTransport::new().route("/ids", 200, r#"["EUW1_7"]"#));
    let api = api(Arc::clone(&transport), "euw1");

    let ids = api.match_ids_by_season("p-1", 2023, &[], 100).await.unwrap();

    assert_eq!(ids, vec!["EUW1_7"]);
    // 2023-01-11 .. 2023-11-20 is 313 days
    assert_eq!(transport.count("/ids"), 11);

    let err = api.match_ids_by_season("p-1", 2019, &[], 100).await.unwrap_err();
    assert!(matches!(err, RiotError::UnknownSeason(2019)));
}

#[tokio::test(start_paused = true)]
async fn test_optional_data_degrades_to_none() {
    let body = match_json("EUW1_1", "p-1", "Orianna", true).to_string();
    let transport = Arc::new(
        RouteTransport::new()
            .route("/matches/EUW1_1", 200, body)
            .route("/matches/EUW1_1/timeline", 503, ""),
    );
    let api = api(Arc::clone(&transport), "euw1");

    assert!(api.get_match("EUW1_1").await.is_ok());
    // exhausts its retries, then degrades
    assert!(api.get_timeline("EUW1_1").await.is_none());
    assert_eq!(transport.count("/timeline"), 6);
    assert!(api.summoner_profile("p-1").await.is_none());
    assert!(transport
        .requests()
        .iter()
        .any(|r| r.url == "https://euw1.api.riotgames.com/lol/summoner/v4/summoners/by-puuid/p-1"));

    let err = api.get_match("EUW1_404").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_prefetch_warms_cache() {
    let transport = Arc::new(
        RouteTransport::new()
            .route("/matches/EUW1_1", 200, match_json("EUW1_1", "p", "Ahri", true).to_string())
            .route("/matches/EUW1_2", 200, match_json("EUW1_2", "p", "Zed", false).to_string()),
    );
    let api = api(Arc::clone(&transport), "euw1");

    let queued = api.prefetch_matches(&["EUW1_1".to_string(), "EUW1_2".to_string()]);
    assert_eq!(queued, 2);

    // let the worker drain the queue
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(api.client().get_statistics().queue_depth, 0);

    api.get_match("EUW1_1").await.unwrap();
    api.get_match("EUW1_2").await.unwrap();
    assert_eq!(transport.count("/matches/"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_league_entries_and_mastery_on_platform_host() {
    let transport = Arc::new(
        RouteTransport::new()
            .route(
                "/entries/by-puuid/p-1",
                200,
                r#"[
                    {"leagueId":"x","queueType":"RANKED_FLEX_SR","tier":"SILVER","rank":"I","leaguePoints":12,"wins":3,"losses":4,"hotStreak":false},
                    {"leagueId":"y","queueType":"RANKED_SOLO_5x5","tier":"GOLD","rank":"II","leaguePoints":45,"wins":10,"losses":8,"veteran":true}
                ]"#,
            )
            .route(
                "/champion-masteries/by-puuid/p-1",
                200,
                r#"[{"championId":61,"championLevel":7,"championPoints":250000}]"#,
            ),
    );
    let api = api(Arc::clone(&transport), "euw1");

    let entries = api.league_entries("p-1").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].to_string(), "Solo/Duo: GOLD II 45 LP (10W 8L)");
    assert_eq!(entries[0].queue_label(), "Flex");

    let mastery = api.champion_mastery("p-1").await.unwrap();
    assert_eq!(mastery[0]["championPoints"], 250000);

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://euw1.api.riotgames.com/lol/league/v4/entries/by-puuid/p-1",
            "https://euw1.api.riotgames.com/lol/champion-mastery/v4/champion-masteries/by-puuid/p-1",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_league_and_mastery_failures_are_none() {
    let transport = Arc::new(RouteTransport::new().route("/entries/by-puuid/p-odd", 200, r#"{"status":"odd"}"#));
    let api = api(transport, "na1");

    // unrouted requests answer 404
    assert!(api.league_entries("p-missing").await.is_none());
    assert!(api.champion_mastery("p-missing").await.is_none());
    // an object where a list is expected
    assert!(api.league_entries("p-odd").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unranked_player_has_empty_league_entries() {
    let transport = Arc::new(RouteTransport::new().route("/entries/by-puuid/p-new", 200, "[]"));
    let api = api(transport, "kr");

    assert_eq!(api.league_entries("p-new").await, Some(Vec::<RankedEntry>::new()));
}
