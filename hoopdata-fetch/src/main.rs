//! hoopdata-fetch - shot and lineup collector
//!
//! Walks every team-season partition, fetches each game's shots and lineups,
//! and accumulates the joined records under the data directory. Interrupted
//! runs (Ctrl-C, crash, `--limit`) resume where they stopped.

use anyhow::{Context, Result};
use clap::Parser;
use hoopdata_common::config::{resolve_config_path, resolve_data_dir};
use hoopdata_common::{FetchConfig, FlushPolicy};
use hoopdata_fetch::{Orchestrator, PipelineConfig, Sources};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Units processed by `--test`
const TEST_MODE_UNITS: u32 = 3;
/// Log filter until the config file is read
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "hoopdata-fetch", version, about = "Fetch shot data with on-court lineups for all teams")]
struct Args {
    /// Test mode: only fetch 3 games
    #[arg(long)]
    test: bool,

    /// Stop after this many games
    #[arg(long, value_name = "N")]
    limit: Option<u32>,

    /// Output directory (checkpoint and datasets)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Season to collect, e.g. 2024-25 (repeatable; replaces configured seasons)
    #[arg(long = "season", value_name = "SEASON")]
    seasons: Vec<String>,

    /// Save the team dataset after every game instead of once per team
    #[arg(long)]
    flush_every_unit: bool,
}

impl Args {
    fn apply(&self, config: &mut FetchConfig) {
        if !self.seasons.is_empty() {
            config.seasons = self.seasons.clone();
        }
        if self.flush_every_unit {
            config.flush_policy = FlushPolicy::Unit;
        }
        config.unit_limit = match (self.test, self.limit) {
            (true, Some(limit)) => Some(limit.min(TEST_MODE_UNITS)),
            (true, None) => Some(TEST_MODE_UNITS),
            (false, Some(limit)) => Some(limit),
            (false, None) => config.unit_limit,
        };
    }
}

/// Handle for switching the startup log filter to the configured level
struct LogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    /// RUST_LOG was set and wins over the config file
    pinned: bool,
}

impl LogLevel {
    fn from_env() -> (reload::Layer<EnvFilter, Registry>, Self) {
        Self::new(EnvFilter::try_from_default_env().ok())
    }

    fn new(env_filter: Option<EnvFilter>) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let pinned = env_filter.is_some();
        let (layer, handle) =
            reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL)));
        (layer, Self { handle, pinned })
    }

    fn apply_configured(&self, level: &str) -> Result<()> {
        if self.pinned {
            return Ok(());
        }
        self.handle
            .reload(EnvFilter::new(level))
            .context("Failed to apply configured log level")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging comes up before the config load so its messages are kept
    let (filter, log_level) = LogLevel::from_env();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = FetchConfig::load(&config_path)?;
    args.apply(&mut config);
    log_level.apply_configured(&config.logging.level)?;

    info!("Starting hoopdata-fetch");
    info!(
        "Version: {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let data_dir = resolve_data_dir(args.data_dir.as_deref(), &config);
    info!("Data directory: {}", data_dir.display());
    info!("Seasons: {}", config.seasons.join(", "));
    if let Some(limit) = config.unit_limit {
        info!("Unit limit: {} games", limit);
    }

    let sources = Sources::http(&config).context("Failed to build upstream clients")?;
    let mut orchestrator = Orchestrator::open(PipelineConfig::from(&config), sources, &data_dir)
        .context("Failed to load checkpoint state")?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested, finishing current game");
            signal_token.cancel();
        }
    });

    let stats = orchestrator
        .run(&cancel)
        .await
        .context("Run aborted; rerun to resume from the last checkpoint")?;

    info!("Total games processed: {}", stats.units_processed);
    info!("Total shots fetched: {}", stats.records_accrued);
    info!(
        "Output files in: {}",
        orchestrator.accumulator().output_dir().display()
    );

    Ok(())
}
