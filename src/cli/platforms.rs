//! CLI command for listing supported platforms

use clap::Args;
use serde_json::json;

use super::{CliError, OutputFormat};
use crate::riot::routing::{PlatformRoute, PLATFORMS};

/// Platforms subcommand
#[derive(Debug, Args)]
pub struct PlatformsCommand {
    /// Output format; defaults to --output-format
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Only show platforms routed through this regional cluster
    #[arg(long)]
    pub region: Option<String>,
}

impl PlatformsCommand {
    /// Execute the platforms command
    pub fn execute(&self, default_format: OutputFormat) -> Result<(), CliError> {
        let routes = self.routes()?;

        match self.format.unwrap_or(default_format) {
            OutputFormat::Json => {
                let entries: Vec<_> = routes
                    .iter()
                    .map(|route| {
                        json!({
                            "platform": route.platform,
                            "match_region": route.match_region,
                            "account_region": route.account_region,
                            "platform_host": route.platform_base(),
                            "match_host": route.match_base(),
                            "account_host": route.account_base(),
                        })
                    })
                    .collect();
                println!("{}", json!({ "platforms": entries, "count": entries.len() }));
            }
            OutputFormat::Human => {
                println!("{:<10} {:<10} {:<10}", "PLATFORM", "MATCHES", "ACCOUNTS");
                for route in &routes {
                    println!(
                        "{:<10} {:<10} {:<10}",
                        route.platform, route.match_region, route.account_region
                    );
                }
                println!("\n{} platform(s)", routes.len());
            }
        }
        Ok(())
    }

    /// Routes matching the `--region` filter
    pub fn routes(&self) -> Result<Vec<PlatformRoute>, CliError> {
        let Some(region) = &self.region else {
            return Ok(PLATFORMS.to_vec());
        };

        let wanted = region.trim().to_ascii_lowercase();
        let routes: Vec<_> = PLATFORMS
            .iter()
            .filter(|route| {
                route.match_region.host() == wanted || route.account_region.host() == wanted
            })
            .copied()
            .collect();

        if routes.is_empty() {
            return Err(CliError::InvalidArgument(format!(
                "unknown region: {region}. Valid options: americas, europe, asia, sea"
            )));
        }
        Ok(routes)
    }
}
