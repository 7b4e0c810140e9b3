//! Validation subcommand

use clap::Parser;

use super::CliError;
use crate::riot::{routing, season};

/// Validate command for checking inputs offline
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// What to validate
    #[command(subcommand)]
    pub target: ValidateTarget,
}

/// Target type for validation
#[derive(clap::Subcommand, Debug)]
pub enum ValidateTarget {
    /// Validate a Riot ID
    RiotId {
        /// Riot ID to validate (e.g., "Caps#EUW")
        riot_id: String,
    },
    /// Validate a platform id
    Platform {
        /// Platform id (e.g., euw1)
        platform: String,
    },
    /// Check that a season has known bounds
    Season {
        /// Season year (e.g., 2024)
        year: i32,
    },
}

impl ValidateCommand {
    /// Execute the validation command
    pub fn execute(&self) -> Result<(), CliError> {
        match &self.target {
            ValidateTarget::RiotId { riot_id } => self.validate_riot_id(riot_id),
            ValidateTarget::Platform { platform } => self.validate_platform(platform),
            ValidateTarget::Season { year } => self.validate_season(*year),
        }
    }

    fn validate_riot_id(&self, riot_id: &str) -> Result<(), CliError> {
        match crate::identifier::RiotId::parse(riot_id) {
            Ok(id) => {
                println!("Valid Riot ID: {}", id);
                println!("  Game name: {}", id.game_name());
                println!("  Tag line: {}", id.tag_line());
                println!("  Filesystem safe: {}", id.to_filesystem_safe());
                Ok(())
            }
            Err(e) => {
                eprintln!("Invalid Riot ID: {}", e);
                Err(e.into())
            }
        }
    }

    fn validate_platform(&self, platform: &str) -> Result<(), CliError> {
        let route = routing::lookup(platform)?;
        println!("Valid platform: {}", route.platform);
        println!("  Platform host: {}", route.platform_base());
        println!("  Match-V5 host: {}", route.match_base());
        println!("  Account-V1 host: {}", route.account_base());
        Ok(())
    }

    fn validate_season(&self, year: i32) -> Result<(), CliError> {
        let Some((start, end)) = season::season_bounds(year) else {
            let known: Vec<String> = season::known_seasons()
                .iter()
                .map(i32::to_string)
                .collect();
            return Err(CliError::InvalidArgument(format!(
                "unknown season {year}. Known seasons: {}",
                known.join(", ")
            )));
        };

        let segments = season::segment_time_range(start, end, season::MAX_SEGMENT_DAYS);
        println!("Valid season: {year}");
        println!("  Start: {start}");
        println!("  End: {end}");
        println!("  Segments: {}", segments.len());
        Ok(())
    }
}
