//! Configuration loading and data directory resolution
//!
//! Run-scope settings come from an optional TOML file. Every field has a
//! compiled default, so a missing file only produces a warning. The data
//! directory follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `HOOPDATA_DATA_DIR` environment variable
//! 3. `data_dir` in the TOML file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "HOOPDATA_DATA_DIR";
/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "HOOPDATA_CONFIG";

/// When partition datasets are written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushPolicy {
    /// Rewrite the dataset once, after the partition's last unit
    #[default]
    Partition,
    /// Rewrite the dataset after every unit, before its checkpoint is committed
    Unit,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Outbound call pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Minimum spacing between upstream calls, in seconds
    pub request_delay_secs: f64,
    /// Completed units between extended rests (0 disables rests)
    pub batch_rest_interval: u32,
    /// Length of an extended rest, in seconds
    pub batch_rest_duration_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            request_delay_secs: 1.5,
            batch_rest_interval: 50,
            batch_rest_duration_secs: 30.0,
        }
    }
}

/// Primary source retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Backoff after attempt k (0-based) is `backoff_base_secs * 2^k`
    pub backoff_base_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_secs: 2.0,
        }
    }
}

/// Upstream endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout, in seconds
    pub timeout_secs: f64,
    /// Base URL of the stats API (game finder and shot chart endpoints)
    pub stats_base_url: String,
    /// Lineup feed URL; `{game_id}` is substituted per game
    pub lineup_url_template: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60.0,
            stats_base_url: "https://stats.nba.com/stats".to_string(),
            lineup_url_template: "https://data.nba.com/data/v2015/json/mobile_teams/nba/lineups/{game_id}.json".to_string(),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Root of all output (checkpoint file and datasets)
    pub data_dir: Option<PathBuf>,
    /// Season labels to collect, in processing order (e.g. "2023-24")
    pub seasons: Vec<String>,
    /// Stop after this many units (constrained / test runs)
    pub unit_limit: Option<u32>,
    pub flush_policy: FlushPolicy,
    pub logging: LoggingConfig,
    pub pacing: PacingConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            seasons: vec!["2023-24".to_string(), "2024-25".to_string()],
            unit_limit: None,
            flush_policy: FlushPolicy::default(),
            logging: LoggingConfig::default(),
            pacing: PacingConfig::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields defaults with a warning. A file that exists but
    /// cannot be read or parsed is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot drive a run
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("pacing.request_delay_secs", self.pacing.request_delay_secs),
            ("pacing.batch_rest_duration_secs", self.pacing.batch_rest_duration_secs),
            ("retry.backoff_base_secs", self.retry.backoff_base_secs),
            ("http.timeout_secs", self.http.timeout_secs),
        ];
        for (name, secs) in durations {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(Error::Config(format!(
                    "{} must be a non-negative, representable number of seconds, got {}",
                    name, secs
                )));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".to_string()));
        }

        if !self.http.lineup_url_template.contains("{game_id}") {
            return Err(Error::Config(
                "http.lineup_url_template must contain {game_id}".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.pacing.request_delay_secs)
    }

    pub fn batch_rest_duration(&self) -> Duration {
        Duration::from_secs_f64(self.pacing.batch_rest_duration_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.retry.backoff_base_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.http.timeout_secs)
    }
}

/// Resolve which config file to read: CLI → ENV → platform default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::config_dir()
        .map(|d| d.join("hoopdata").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("hoopdata.toml"))
}

/// Resolve the data directory: CLI → ENV → TOML → compiled default
pub fn resolve_data_dir(cli_arg: Option<&Path>, config: &FetchConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.data_dir {
        return path.clone();
    }

    default_data_dir()
}

/// OS-dependent default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hoopdata"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}
