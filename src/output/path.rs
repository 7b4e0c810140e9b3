//! Directory layout of an export
//!
//! Everything for one player lands under `{root}/{platform}/{player}/`:
//!
//! ```text
//! data/euw1/caps_euw/
//! ├── matches/EUW1_123.json
//! ├── timelines/EUW1_123.json
//! ├── matches.csv
//! ├── summoner.json
//! ├── league.json
//! ├── champion_mastery.json
//! └── client_stats.json
//! ```

use std::path::{Path, PathBuf};

use super::{OutputError, OutputResult};
use crate::identifier::RiotId;

/// Index file name
pub const INDEX_FILE: &str = "matches.csv";

/// Client statistics file name
pub const STATS_FILE: &str = "client_stats.json";

/// Summoner profile file name
pub const SUMMONER_FILE: &str = "summoner.json";

/// Ranked standings file name
pub const LEAGUE_FILE: &str = "league.json";

/// Champion mastery file name
pub const MASTERY_FILE: &str = "champion_mastery.json";

/// Paths for one player's export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    player_dir: PathBuf,
}

impl OutputLayout {
    /// Layout for a player known by Riot ID
    pub fn for_riot_id(root: impl AsRef<Path>, platform: &str, riot_id: &RiotId) -> Self {
        Self::new(root, platform, &riot_id.to_filesystem_safe())
    }

    /// Layout for a player known only by PUUID
    ///
    /// Uses the first 16 characters of the PUUID as directory name.
    pub fn for_puuid(root: impl AsRef<Path>, platform: &str, puuid: &str) -> Self {
        let short: String = puuid
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(16)
            .collect();
        Self::new(root, platform, &format!("puuid_{short}"))
    }

    fn new(root: impl AsRef<Path>, platform: &str, player: &str) -> Self {
        Self {
            player_dir: root
                .as_ref()
                .join(platform.to_ascii_lowercase())
                .join(player),
        }
    }

    /// Player directory
    pub fn player_dir(&self) -> &Path {
        &self.player_dir
    }

    /// Directory of raw match JSON files
    pub fn matches_dir(&self) -> PathBuf {
        self.player_dir.join("matches")
    }

    /// Directory of raw timeline JSON files
    pub fn timelines_dir(&self) -> PathBuf {
        self.player_dir.join("timelines")
    }

    /// Raw match file for `match_id`
    pub fn match_path(&self, match_id: &str) -> PathBuf {
        self.matches_dir().join(format!("{}.json", sanitize(match_id)))
    }

    /// Raw timeline file for `match_id`
    pub fn timeline_path(&self, match_id: &str) -> PathBuf {
        self.timelines_dir().join(format!("{}.json", sanitize(match_id)))
    }

    /// CSV index path
    pub fn index_path(&self) -> PathBuf {
        self.player_dir.join(INDEX_FILE)
    }

    /// Statistics path
    pub fn stats_path(&self) -> PathBuf {
        self.player_dir.join(STATS_FILE)
    }

    /// Summoner profile path
    pub fn summoner_path(&self) -> PathBuf {
        self.player_dir.join(SUMMONER_FILE)
    }

    /// Ranked standings path
    pub fn league_path(&self) -> PathBuf {
        self.player_dir.join(LEAGUE_FILE)
    }

    /// Champion mastery path
    pub fn mastery_path(&self) -> PathBuf {
        self.player_dir.join(MASTERY_FILE)
    }

    /// Create the player, matches and (optionally) timelines directories
    pub fn create_dirs(&self, with_timelines: bool) -> OutputResult<()> {
        let mut dirs = vec![self.matches_dir()];
        if with_timelines {
            dirs.push(self.timelines_dir());
        }
        for dir in dirs {
            std::fs::create_dir_all(&dir).map_err(|e| {
                OutputError::IoError(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }
}

/// Match ids look like `EUW1_6543210987`; strip anything that could escape
/// the directory.
fn sanitize(match_id: &str) -> String {
    match_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
