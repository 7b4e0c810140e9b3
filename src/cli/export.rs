//! Export command implementation

use chrono::{DateTime, NaiveDate};
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{CliError, PlatformsCommand, ValidateCommand};
use crate::client::{ApiClient, ClientConfig, ClientError, ClientStatistics};
use crate::identifier::RiotId;
use crate::metrics::ExportMetrics;
use crate::output::{
    CsvMatchIndexWriter, JsonStore, MatchIndexWriter, MatchSummary, OutputLayout, OutputWriter,
};
use crate::riot::pagination::MatchIdQuery;
use crate::riot::{RankedEntry, RiotApi, RiotError};
use crate::shutdown::SharedShutdown;

/// Maximum allowed concurrency
const MAX_CONCURRENCY: usize = 32;

/// Default data directory
const DEFAULT_DATA_DIR: &str = "data";

/// Try to parse datetime from RFC3339 format
///
/// Inputs without a timezone designator are taken as UTC.
/// Returns epoch seconds, or None if parsing fails.
fn try_parse_datetime_rfc3339(input: &str) -> Option<i64> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.timestamp());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&format!("{input}Z")) {
        return Some(dt.timestamp());
    }

    None
}

/// Parse a start time from YYYY-MM-DD or RFC3339 into epoch seconds.
///
/// Date-only input means start of day (00:00:00 UTC).
fn parse_start_time_flexible(input: &str) -> Result<i64, CliError> {
    if let Some(ts) = try_parse_datetime_rfc3339(input) {
        return Ok(ts);
    }

    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid start time: {e}")))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::InvalidArgument("Invalid start time".to_string()))?;
    Ok(datetime.and_utc().timestamp())
}

/// Parse an end time from YYYY-MM-DD or RFC3339 into epoch seconds.
///
/// Date-only input means end of day (23:59:59 UTC) so the date is included.
fn parse_end_time_flexible(input: &str) -> Result<i64, CliError> {
    if let Some(ts) = try_parse_datetime_rfc3339(input) {
        return Ok(ts);
    }

    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid end time: {e}")))?;
    let datetime = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| CliError::InvalidArgument("Invalid end time".to_string()))?;
    Ok(datetime.and_utc().timestamp())
}

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}. Valid options: json, human")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Human => f.write_str("human"),
        }
    }
}

/// lol-match-exporter CLI
#[derive(Parser, Debug)]
#[command(
    name = "lol-match-exporter",
    about = "Export League of Legends match history from the Riot Games API",
    version
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Riot API key
    #[arg(long, global = true, env = "RIOT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Platform the player plays on (euw1, na1, kr, ...)
    #[arg(long, global = true, default_value = "euw1")]
    pub platform: String,

    /// Root directory for exported data
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Matches fetched concurrently (1-32)
    #[arg(long, global = true, default_value = "4", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Attempts per request before giving up (1-20)
    #[arg(long, global = true, default_value = "6", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: u32,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Serve Prometheus metrics on this address
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// API key, which must be non-empty
    pub fn api_key(&self) -> Result<&str, CliError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                CliError::ConfigurationError(
                    "no API key: pass --api-key or set RIOT_API_KEY".to_string(),
                )
            })
    }

    /// Root directory for exported data
    pub fn data_root(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Client configuration derived from the global flags
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default().with_max_attempts(self.max_attempts)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a player's match history
    Export(ExportArgs),

    /// List supported platforms and their routing
    Platforms(PlatformsCommand),

    /// Validate inputs without calling the API
    Validate(ValidateCommand),
}

/// Export arguments
#[derive(Args, Debug, Clone)]
#[command(group(
    clap::ArgGroup::new("player")
        .required(true)
        .args(["riot_id", "puuid"])
))]
pub struct ExportArgs {
    /// Riot ID of the player (e.g. "Caps#EUW")
    #[arg(long)]
    pub riot_id: Option<String>,

    /// PUUID of the player
    #[arg(long)]
    pub puuid: Option<String>,

    /// Number of matches to export (per 30-day segment with --season)
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub count: u32,

    /// Queue id filter, repeatable (e.g. --queue 420 --queue 440)
    #[arg(long = "queue")]
    pub queues: Vec<u16>,

    /// Start time (YYYY-MM-DD or RFC3339)
    #[arg(long)]
    pub start_time: Option<String>,

    /// End time (YYYY-MM-DD or RFC3339)
    #[arg(long)]
    pub end_time: Option<String>,

    /// Export a whole season (e.g. 2024)
    #[arg(long, conflicts_with_all = ["start_time", "end_time"])]
    pub season: Option<i32>,

    /// Also export match timelines
    #[arg(long)]
    pub timelines: bool,

    /// Also export ranked standings (league.json)
    #[arg(long)]
    pub league: bool,

    /// Also export champion mastery (champion_mastery.json)
    #[arg(long)]
    pub mastery: bool,

    /// Export everything available: timelines, league and mastery
    #[arg(long)]
    pub all: bool,
}

/// Summary of one export run
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Riot ID or PUUID as given
    pub player: String,
    /// Resolved PUUID
    pub puuid: String,
    /// Platform id
    pub platform: String,
    /// Player directory
    pub output_dir: PathBuf,
    /// Match ids returned by the listing
    pub matches_listed: usize,
    /// Matches written to the index
    pub matches_saved: usize,
    /// Of those, matches already on disk and not fetched again
    pub matches_reused: usize,
    /// Matches that could not be exported
    pub matches_failed: usize,
    /// Timelines present on disk for indexed matches
    pub timelines_saved: usize,
    /// Ranked standings, when requested and available
    pub ranked: Option<Vec<RankedEntry>>,
    /// Whether champion mastery was written
    pub mastery_saved: bool,
    /// Ids of the failed matches
    pub failed_match_ids: Vec<String>,
    /// Whether Ctrl+C cut the export short
    pub interrupted: bool,
    /// Client counters at the end of the run
    pub statistics: ClientStatistics,
}

#[derive(Debug, Clone)]
enum Player {
    RiotId(RiotId),
    Puuid(String),
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::RiotId(id) => write!(f, "{id}"),
            Player::Puuid(puuid) => f.write_str(puuid),
        }
    }
}

impl ExportArgs {
    fn player(&self) -> Result<Player, CliError> {
        match (&self.riot_id, &self.puuid) {
            (Some(riot_id), _) => Ok(Player::RiotId(RiotId::parse(riot_id)?)),
            (None, Some(puuid)) if !puuid.trim().is_empty() => {
                Ok(Player::Puuid(puuid.trim().to_string()))
            }
            _ => Err(CliError::InvalidArgument(
                "one of --riot-id or --puuid is required".to_string(),
            )),
        }
    }

    /// Whether timelines are exported (`--timelines` or `--all`)
    pub fn wants_timelines(&self) -> bool {
        self.timelines || self.all
    }

    /// Whether ranked standings are exported (`--league` or `--all`)
    pub fn wants_league(&self) -> bool {
        self.league || self.all
    }

    /// Whether champion mastery is exported (`--mastery` or `--all`)
    pub fn wants_mastery(&self) -> bool {
        self.mastery || self.all
    }

    /// Parsed `--start-time`/`--end-time` in epoch seconds
    pub fn time_range(&self) -> Result<(Option<i64>, Option<i64>), CliError> {
        let start = self
            .start_time
            .as_deref()
            .map(parse_start_time_flexible)
            .transpose()?;
        let end = self
            .end_time
            .as_deref()
            .map(parse_end_time_flexible)
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Err(CliError::InvalidArgument(format!(
                    "start time {start} must be before end time {end}"
                )));
            }
        }
        Ok((start, end))
    }

    /// Run the export against the live API and print the report.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let api_key = cli.api_key()?;
        let config = cli.client_config();
        config.validate()?;

        let client = Arc::new(ApiClient::new(config, api_key)?);
        let api = RiotApi::new(Arc::clone(&client), &cli.platform)?;
        let progress = create_progress_bar(cli.output_format);

        let result = self
            .run(&api, &cli.data_root(), cli.concurrency, shutdown, &progress)
            .await;

        progress.finish_and_clear();
        client.shutdown().await;

        match cli.output_format {
            OutputFormat::Json => output_json(&result),
            OutputFormat::Human => output_human(&result),
        }

        match result {
            Ok(report) if report.interrupted => Err(CliError::Interrupted),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Export through an existing [`RiotApi`] into `root`.
    ///
    /// Matches already present on disk are reused instead of fetched again.
    /// Individual match failures are reported, not fatal; listing and
    /// account failures abort the run.
    pub async fn run(
        &self,
        api: &RiotApi,
        root: &Path,
        concurrency: usize,
        shutdown: SharedShutdown,
        progress: &ProgressBar,
    ) -> Result<ExportReport, CliError> {
        let player = self.player()?;
        let metrics = ExportMetrics::start(player.to_string());

        let result = self
            .run_for_player(&player, api, root, concurrency, shutdown, progress, &metrics)
            .await;

        match &result {
            Ok(report) => metrics.record_success(report.matches_saved, report.matches_failed),
            Err(e) => metrics.record_failure(&e.to_string()),
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_for_player(
        &self,
        player: &Player,
        api: &RiotApi,
        root: &Path,
        concurrency: usize,
        shutdown: SharedShutdown,
        progress: &ProgressBar,
        metrics: &ExportMetrics,
    ) -> Result<ExportReport, CliError> {
        let (start_time, end_time) = self.time_range()?;
        let platform = api.route().platform;

        let (puuid, layout) = match player {
            Player::RiotId(id) => (
                api.puuid_by_riot_id(id).await?,
                OutputLayout::for_riot_id(root, platform, id),
            ),
            Player::Puuid(puuid) => (
                puuid.clone(),
                OutputLayout::for_puuid(root, platform, puuid),
            ),
        };

        let match_ids = match self.season {
            Some(season) => {
                api.match_ids_by_season(&puuid, season, &self.queues, self.count)
                    .await?
            }
            None => {
                let query = MatchIdQuery::recent(self.count)
                    .with_queues(self.queues.iter().copied())
                    .with_time_range(start_time, end_time);
                api.match_ids(&puuid, &query).await?
            }
        };
        info!(
            player = %player,
            platform,
            matches = match_ids.len(),
            "Listed match ids"
        );

        layout.create_dirs(self.wants_timelines())?;
        if let Some(profile) = api.summoner_profile(&puuid).await {
            JsonStore::write(&layout.summoner_path(), &profile)?;
        }

        let ranked = if self.wants_league() {
            let entries = api.league_entries(&puuid).await;
            if let Some(entries) = &entries {
                JsonStore::write(&layout.league_path(), entries)?;
            }
            entries
        } else {
            None
        };

        let mut mastery_saved = false;
        if self.wants_mastery() {
            if let Some(mastery) = api.champion_mastery(&puuid).await {
                JsonStore::write(&layout.mastery_path(), &mastery)?;
                mastery_saved = true;
            }
        }

        progress.set_length(match_ids.len() as u64);
        progress.set_message(player.to_string());

        let ctx = MatchExportContext {
            api,
            layout: &layout,
            puuid: &puuid,
            timelines: self.wants_timelines(),
            shutdown,
            metrics,
            progress,
        };
        let ctx = &ctx;
        let outcomes: Vec<MatchOutcome> = stream::iter(match_ids.iter().cloned())
            .map(|match_id| ctx.export_match(match_id))
            .buffered(concurrency.clamp(1, MAX_CONCURRENCY))
            .collect()
            .await;

        let mut summaries = Vec::with_capacity(outcomes.len());
        let mut failed_match_ids = Vec::new();
        let mut matches_reused = 0;
        let mut interrupted = false;
        for outcome in outcomes {
            match outcome {
                MatchOutcome::Saved { summary, reused } => {
                    if reused {
                        matches_reused += 1;
                    }
                    summaries.push(summary);
                }
                MatchOutcome::Failed { match_id } => failed_match_ids.push(match_id),
                MatchOutcome::Skipped => interrupted = true,
            }
        }
        if interrupted {
            warn!(player = %player, "Export interrupted, writing partial index");
        }

        let mut writer = CsvMatchIndexWriter::new(layout.index_path())?;
        writer.write_summaries(&summaries)?;
        writer.close()?;

        let statistics = api.client().get_statistics();
        JsonStore::write(&layout.stats_path(), &statistics)?;

        Ok(ExportReport {
            player: player.to_string(),
            puuid,
            platform: platform.to_string(),
            output_dir: layout.player_dir().to_path_buf(),
            matches_listed: match_ids.len(),
            matches_saved: summaries.len(),
            matches_reused,
            matches_failed: failed_match_ids.len(),
            timelines_saved: summaries.iter().filter(|s| s.has_timeline).count(),
            ranked,
            mastery_saved,
            failed_match_ids,
            interrupted,
            statistics,
        })
    }
}

// ─── Per-match export ────────────────────────────────────────────────────────

enum MatchOutcome {
    Saved { summary: MatchSummary, reused: bool },
    Failed { match_id: String },
    Skipped,
}

struct MatchExportContext<'a> {
    api: &'a RiotApi,
    layout: &'a OutputLayout,
    puuid: &'a str,
    timelines: bool,
    shutdown: SharedShutdown,
    metrics: &'a ExportMetrics,
    progress: &'a ProgressBar,
}

impl MatchExportContext<'_> {
    async fn export_match(&self, match_id: String) -> MatchOutcome {
        let outcome = self.export_match_inner(match_id).await;
        self.progress.inc(1);
        outcome
    }

    async fn export_match_inner(&self, match_id: String) -> MatchOutcome {
        if self.shutdown.is_shutdown_requested() {
            return MatchOutcome::Skipped;
        }

        let match_path = self.layout.match_path(&match_id);
        let stored = if JsonStore::exists(&match_path) {
            JsonStore::read(&match_path).ok()
        } else {
            None
        };

        let (match_json, reused) = match stored {
            Some(value) => (value, true),
            None => match self.api.get_match(&match_id).await {
                Ok(value) => (value, false),
                Err(RiotError::Client(ClientError::Shutdown)) => return MatchOutcome::Skipped,
                Err(e) => return self.failed(match_id, &e),
            },
        };

        if !reused {
            if let Err(e) = JsonStore::write(&match_path, &match_json) {
                return self.failed(match_id, &e);
            }
        }

        let has_timeline = self.timelines && self.export_timeline(&match_id).await;

        match MatchSummary::from_match(&match_json, self.puuid) {
            Some(summary) => {
                self.metrics.record_match_saved();
                MatchOutcome::Saved {
                    summary: summary.with_timeline(has_timeline),
                    reused,
                }
            }
            None => self.failed(match_id, &RiotError::MissingField("info.participants[puuid]")),
        }
    }

    async fn export_timeline(&self, match_id: &str) -> bool {
        let path = self.layout.timeline_path(match_id);
        if JsonStore::exists(&path) {
            return true;
        }
        match self.api.get_timeline(match_id).await {
            Some(timeline) => match JsonStore::write(&path, &timeline) {
                Ok(()) => true,
                Err(e) => {
                    warn!(match_id, error = %e, "Failed to write timeline");
                    false
                }
            },
            None => false,
        }
    }

    fn failed(&self, match_id: String, err: &(dyn std::error::Error + 'static)) -> MatchOutcome {
        let message = err.to_string();
        if let Some(RiotError::Client(client_err)) = err.downcast_ref::<RiotError>() {
            if client_err.is_exhaustion() {
                error!(match_id = %match_id, error = %client_err, "Retries exhausted");
            }
        }
        self.metrics.record_match_failed(&match_id, &message);
        MatchOutcome::Failed { match_id }
    }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Output result as JSON
fn output_json(result: &Result<ExportReport, CliError>) {
    let output = match result {
        Ok(report) => serde_json::json!({
            "success": !report.interrupted && report.matches_failed == 0,
            "report": report,
        }),
        Err(e) => serde_json::json!({
            "success": false,
            "error": e.to_string(),
        }),
    };
    println!("{output}");
}

/// Output result in human-readable format
fn output_human(result: &Result<ExportReport, CliError>) {
    match result {
        Ok(report) => {
            if report.interrupted {
                println!("\nExport interrupted, partial results saved.");
            } else {
                println!("\nExport completed successfully!");
            }
            println!("Player: {} ({})", report.player, report.platform);
            println!("Output: {}", report.output_dir.display());
            println!("Matches listed: {}", report.matches_listed);
            println!(
                "Matches saved: {} ({} already on disk)",
                report.matches_saved, report.matches_reused
            );
            if report.timelines_saved > 0 {
                println!("Timelines saved: {}", report.timelines_saved);
            }
            match &report.ranked {
                Some(entries) if entries.is_empty() => println!("Ranked: unranked"),
                Some(entries) => {
                    for entry in entries {
                        println!("Ranked {entry}");
                    }
                }
                None => {}
            }
            if report.mastery_saved {
                println!("Champion mastery saved");
            }
            if report.matches_failed > 0 {
                println!("Matches failed: {}", report.matches_failed);
                for match_id in &report.failed_match_ids {
                    println!("  - {match_id}");
                }
            }
            println!("Requests: {}", report.statistics);
        }
        Err(e) => {
            eprintln!("\nExport failed!");
            eprintln!("Error: {e}");
            error!("Export failed: {}", e);
        }
    }
}

// ─── Progress bar ────────────────────────────────────────────────────────────

fn create_progress_bar(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
