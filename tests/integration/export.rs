//! Integration tests for the export flow against a routed fake transport

use std::sync::Arc;
use indicatif::ProgressBar;
use lol_match_exporter::cli::ExportArgs;
use lol_match_exporter::client::ApiClient;
use lol_match_exporter::riot::RiotApi;
use lol_match_exporter::shutdown::ShutdownCoordinator;
use tempfile::TempDir;

use crate::support::{match_json, test_config, RouteTransport};

fn export_args() -> ExportArgs {
    ExportArgs {
        riot_id: Some("Caps#EUW".to_string()),
        puuid: None,
        count: 20,
        queues: vec![420],
        start_time: None,
        end_time: None,
        season: None,
        timelines: true,
        league: false,
        mastery: false,
        all: false,
    }
}

fn riot_transport() -> Arc<RouteTransport> {
    Arc::new(
        RouteTransport::new()
            .route("/accounts/by-riot-id/Caps/EUW", 200, r#"{"puuid":"p-caps"}"#)
            .route("/summoners/by-puuid/p-caps", 200, r#"{"summonerLevel":512}"#)
            .route("/by-puuid/p-caps/ids", 200, r#"["EUW1_3","EUW1_2","EUW1_1"]"#)
            .route("/matches/EUW1_2", 200, match_json("EUW1_2", "p-caps", "Sylas", false).to_string())
            .route("/matches/EUW1_1", 200, match_json("EUW1_1", "p-caps", "Orianna", true).to_string())
            .route("/matches/EUW1_2/timeline", 404, "{}")
            .route("/matches/EUW1_1/timeline", 200, r#"{"info":{"frames":[]}}"#),
    )
}

fn riot_api(transport: Arc<RouteTransport>) -> RiotApi {
    let client = ApiClient::with_transport(test_config(), transport).unwrap();
    RiotApi::new(Arc::new(client), "euw1").unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_export_writes_matches_index_and_stats() {
    let temp = TempDir::new().unwrap();
    let transport = riot_transport();
    let api = riot_api(Arc::clone(&transport));

    let report = export_args()
        .run(&api, temp.path(), 4, ShutdownCoordinator::shared(), &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(report.puuid, "p-caps");
    assert_eq!(report.matches_listed, 3);
    assert_eq!(report.matches_saved, 2);
    assert_eq!(report.matches_reused, 0);
    assert_eq!(report.matches_failed, 1);
    assert_eq!(report.failed_match_ids, vec!["EUW1_3"]);
    assert_eq!(report.timelines_saved, 1);
    assert!(!report.interrupted);

    let dir = temp.path().join("euw1").join("caps_euw");
    assert_eq!(report.output_dir, dir);
    assert!(dir.join("matches/EUW1_1.json").is_file());
    assert!(dir.join("matches/EUW1_2.json").is_file());
    assert!(!dir.join("matches/EUW1_3.json").exists());
    assert!(dir.join("timelines/EUW1_1.json").is_file());
    assert!(!dir.join("timelines/EUW1_2.json").exists());
    assert!(dir.join("summoner.json").is_file());

    let index = std::fs::read_to_string(dir.join("matches.csv")).unwrap();
    let rows: Vec<&str> = index.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("EUW1_2,"));
    assert!(rows[1].contains("Sylas"));
    assert!(rows[2].starts_with("EUW1_1,"));
    assert!(rows[2].ends_with(",true"));

    let stats: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("client_stats.json")).unwrap())
            .unwrap();
    assert!(stats["total_requests"].as_u64().unwrap() >= 6);
}

#[tokio::test(start_paused = true)]
async fn test_second_export_reuses_files_on_disk() {
    let temp = TempDir::new().unwrap();
    let shutdown = ShutdownCoordinator::shared();

    let first = riot_api(riot_transport());
    export_args()
        .run(&first, temp.path(), 2, Arc::clone(&shutdown), &ProgressBar::hidden())
        .await
        .unwrap();

    let transport = riot_transport();
    let second = riot_api(Arc::clone(&transport));
    let report = export_args()
        .run(&second, temp.path(), 2, shutdown, &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(report.matches_saved, 2);
    assert_eq!(report.matches_reused, 2);
    assert_eq!(transport.count("/matches/EUW1_1"), 0);
    // EUW1_2 has no timeline yet, so only that one is asked for again
    assert_eq!(transport.count("/matches/EUW1_2/timeline"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_export_by_puuid_without_timelines() {
    let temp = TempDir::new().unwrap();
    let transport = riot_transport();
    let api = riot_api(Arc::clone(&transport));
    let args = ExportArgs {
        riot_id: None,
        puuid: Some("p-caps".to_string()),
        timelines: false,
        ..export_args()
    };

    let report = args
        .run(&api, temp.path(), 1, ShutdownCoordinator::shared(), &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(report.matches_saved, 2);
    assert_eq!(report.timelines_saved, 0);
    assert_eq!(transport.count("/accounts/"), 0);
    assert_eq!(transport.count("/timeline"), 0);
    assert!(temp.path().join("euw1/puuid_p-caps/matches.csv").is_file());
    assert!(!temp.path().join("euw1/puuid_p-caps/timelines").exists());
}

#[tokio::test(start_paused = true)]
async fn test_export_all_writes_league_and_mastery() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        RouteTransport::new()
            .route("/by-puuid/p-caps/ids", 200, r#"["EUW1_1"]"#)
            .route("/matches/EUW1_1", 200, match_json("EUW1_1", "p-caps", "Orianna", true).to_string())
            .route("/matches/EUW1_1/timeline", 200, r#"{"info":{"frames":[]}}"#)
            .route(
                "/entries/by-puuid/p-caps",
                200,
                r#"[{"queueType":"RANKED_SOLO_5x5","tier":"CHALLENGER","rank":"I","leaguePoints":1200,"wins":200,"losses":150}]"#,
            )
            .route("/champion-masteries/by-puuid/p-caps", 200, r#"[{"championId":61}]"#),
    );
    let api = riot_api(Arc::clone(&transport));
    let args = ExportArgs {
        riot_id: None,
        puuid: Some("p-caps".to_string()),
        timelines: false,
        all: true,
        ..export_args()
    };

    let report = args
        .run(&api, temp.path(), 2, ShutdownCoordinator::shared(), &ProgressBar::hidden())
        .await
        .unwrap();

    let dir = temp.path().join("euw1/puuid_p-caps");
    assert_eq!(report.timelines_saved, 1);
    assert!(report.mastery_saved);
    let ranked = report.ranked.unwrap();
    assert_eq!(ranked[0].tier, "CHALLENGER");
    assert!(dir.join("timelines/EUW1_1.json").is_file());
    assert!(dir.join("champion_mastery.json").is_file());

    let league: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("league.json")).unwrap()).unwrap();
    assert_eq!(league[0]["leaguePoints"], 1200);
}

#[tokio::test(start_paused = true)]
async fn test_missing_league_data_does_not_fail_export() {
    let temp = TempDir::new().unwrap();
    let transport = riot_transport();
    let api = riot_api(Arc::clone(&transport));
    let args = ExportArgs {
        league: true,
        mastery: true,
        ..export_args()
    };

    let report = args
        .run(&api, temp.path(), 2, ShutdownCoordinator::shared(), &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(report.matches_saved, 2);
    assert!(report.ranked.is_none());
    assert!(!report.mastery_saved);
    assert_eq!(transport.count("/league/v4/entries/"), 1);
    assert!(!temp.path().join("euw1/caps_euw/league.json").exists());
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_export_keeps_partial_output() {
    let temp = TempDir::new().unwrap();
    let api = riot_api(riot_transport());
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let report = export_args()
        .run(&api, temp.path(), 4, shutdown, &ProgressBar::hidden())
        .await
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.matches_saved, 0);
    assert!(temp.path().join("euw1/caps_euw/matches.csv").is_file());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_time_range_is_rejected() {
    let temp = TempDir::new().unwrap();
    let api = riot_api(riot_transport());
    let args = ExportArgs {
        start_time: Some("2024-02-01".to_string()),
        end_time: Some("2024-01-01".to_string()),
        ..export_args()
    };

    let result = args
        .run(&api, temp.path(), 4, ShutdownCoordinator::shared(), &ProgressBar::hidden())
        .await;
    assert!(result.is_err());
}
