//! CSV match index writer

use chrono::DateTime;
use csv::Writer;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{MatchIndexWriter, OutputError, OutputResult, OutputWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// One index row: the tracked player's line in a match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    /// Match id, e.g. `EUW1_6543210987`
    pub match_id: String,
    /// Game start, RFC 3339 UTC
    pub game_start: String,
    /// Game length in seconds
    pub duration_s: i64,
    /// Queue id (420 = ranked solo)
    pub queue_id: i64,
    /// Game mode, e.g. `CLASSIC`
    pub game_mode: String,
    /// Patch string
    pub game_version: String,
    /// Champion played
    pub champion: String,
    /// Assigned position
    pub team_position: String,
    /// Whether the player's team won
    pub win: bool,
    /// Kills
    pub kills: i64,
    /// Deaths
    pub deaths: i64,
    /// Assists
    pub assists: i64,
    /// (kills + assists) / max(1, deaths), two decimals
    pub kda: f64,
    /// Lane plus neutral minions
    pub cs: i64,
    /// Gold earned
    pub gold_earned: i64,
    /// Damage dealt to champions
    pub damage_to_champions: i64,
    /// Vision score
    pub vision_score: i64,
    /// Whether the timeline was exported too
    pub has_timeline: bool,
}

impl MatchSummary {
    /// Build the row for `puuid` from raw Match-V5 JSON.
    ///
    /// Returns `None` when the match has no participant with that PUUID.
    pub fn from_match(match_json: &Value, puuid: &str) -> Option<Self> {
        let info = match_json.get("info")?;
        let participant = info
            .get("participants")?
            .as_array()?
            .iter()
            .find(|p| p.get("puuid").and_then(Value::as_str) == Some(puuid))?;

        let int = |v: &Value, key: &str| v.get(key).and_then(Value::as_i64).unwrap_or(0);
        let text = |v: &Value, key: &str| {
            v.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let match_id = match_json
            .pointer("/metadata/matchId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| int(info, "gameId").to_string());

        let start_ms = info
            .get("gameStartTimestamp")
            .or_else(|| info.get("gameCreation"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let game_start = DateTime::from_timestamp_millis(start_ms)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        let kills = int(participant, "kills");
        let deaths = int(participant, "deaths");
        let assists = int(participant, "assists");
        let kda = ((kills + assists) as f64 / deaths.max(1) as f64 * 100.0).round() / 100.0;

        Some(Self {
            match_id,
            game_start,
            duration_s: int(info, "gameDuration"),
            queue_id: int(info, "queueId"),
            game_mode: text(info, "gameMode"),
            game_version: text(info, "gameVersion"),
            champion: text(participant, "championName"),
            team_position: text(participant, "teamPosition"),
            win: participant.get("win").and_then(Value::as_bool).unwrap_or(false),
            kills,
            deaths,
            assists,
            kda,
            cs: int(participant, "totalMinionsKilled") + int(participant, "neutralMinionsKilled"),
            gold_earned: int(participant, "goldEarned"),
            damage_to_champions: int(participant, "totalDamageDealtToChampions"),
            vision_score: int(participant, "visionScore"),
            has_timeline: false,
        })
    }

    /// Mark whether the timeline was exported
    pub fn with_timeline(mut self, has_timeline: bool) -> Self {
        self.has_timeline = has_timeline;
        self
    }
}

/// CSV writer for the match index
pub struct CsvMatchIndexWriter {
    writer: Writer<BufWriter<File>>,
    rows_written: u64,
    seen_ids: HashSet<String>,
    duplicates_skipped: u64,
}

impl CsvMatchIndexWriter {
    /// Create a new index writer, truncating any existing file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new index writer with custom buffer size
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `buffer_size` - Size of write buffer in bytes
    pub fn new_with_buffer_size<P: AsRef<Path>>(path: P, buffer_size: usize) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);

        // Headers are written by csv::Writer on the first serialize()
        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            rows_written: 0,
            seen_ids: HashSet::new(),
            duplicates_skipped: 0,
        })
    }

    /// Rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows skipped because their match id was already written
    pub fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped
    }
}

impl MatchIndexWriter for CsvMatchIndexWriter {
    fn write_summary(&mut self, summary: &MatchSummary) -> OutputResult<()> {
        if !self.seen_ids.insert(summary.match_id.clone()) {
            self.duplicates_skipped += 1;
            debug!(match_id = %summary.match_id, "Skipping duplicate index row");
            return Ok(());
        }

        self.writer
            .serialize(summary)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {}", e)))?;
        self.rows_written += 1;

        if self.rows_written % 100 == 0 {
            self.flush()?;
        }
        Ok(())
    }
}

impl OutputWriter for CsvMatchIndexWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {}", e)))?;

        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {}", e)))?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        info!(
            rows = self.rows_written,
            duplicates = self.duplicates_skipped,
            "CSV index closed"
        );
        Ok(())
    }
}
