//! Main entry point for the lol-match-exporter CLI

use clap::Parser;
use lol_match_exporter::cli::{Cli, Commands};
use lol_match_exporter::metrics;
use lol_match_exporter::shutdown::ShutdownCoordinator;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lol_match_exporter=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    // A missing .env is fine; RIOT_API_KEY may come from the environment
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        if let Err(e) = metrics::init_metrics(addr) {
            warn!(error = %e, "Metrics exporter not started");
        }
    }

    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received - finishing in-flight matches...");
                shutdown.request_shutdown();
            }
        }
    });

    let result = match cli.command {
        Commands::Export(ref args) => args
            .execute(&cli, shutdown.clone())
            .await
            .map_err(anyhow::Error::from),
        Commands::Platforms(ref cmd) => cmd
            .execute(cli.output_format)
            .map_err(anyhow::Error::from),
        Commands::Validate(ref cmd) => cmd.execute().map_err(anyhow::Error::from),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
