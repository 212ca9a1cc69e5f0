//! Integration tests for run configuration
//!
//! Covers loading a complete TOML file from disk and the data directory
//! resolution order (CLI → ENV → TOML → default).
//!
//! Note: tests touching HOOPDATA_DATA_DIR or HOOPDATA_CONFIG are marked
//! #[serial] so they never observe each other's environment.

use hoopdata_common::config::{
    default_data_dir, resolve_config_path, resolve_data_dir, CONFIG_PATH_ENV, DATA_DIR_ENV,
};
use hoopdata_common::{Error, FetchConfig, FlushPolicy};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
data_dir = "/srv/hoopdata"
seasons = ["2022-23", "2023-24"]
unit_limit = 25
flush_policy = "unit"

[logging]
level = "debug"

[pacing]
request_delay_secs = 0.5
batch_rest_interval = 100
batch_rest_duration_secs = 45

[retry]
max_attempts = 5
backoff_base_secs = 1

[http]
timeout_secs = 20
stats_base_url = "http://localhost:8080/stats"
lineup_url_template = "http://localhost:8080/pbp/{game_id}.json"
"#;

#[test]
fn test_full_config_file_loads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let config = FetchConfig::load(&path).unwrap();

    assert_eq!(config.data_dir, Some(PathBuf::from("/srv/hoopdata")));
    assert_eq!(config.seasons, vec!["2022-23", "2023-24"]);
    assert_eq!(config.unit_limit, Some(25));
    assert_eq!(config.flush_policy, FlushPolicy::Unit);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.request_delay(), Duration::from_millis(500));
    assert_eq!(config.pacing.batch_rest_interval, 100);
    assert_eq!(config.batch_rest_duration(), Duration::from_secs(45));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.backoff_base(), Duration::from_secs(1));
    assert_eq!(config.http_timeout(), Duration::from_secs(20));
    assert_eq!(config.http.stats_base_url, "http://localhost:8080/stats");
}

#[test]
fn test_invalid_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();

    match FetchConfig::load(&path) {
        Err(Error::Config(msg)) => {
            assert!(msg.contains("config.toml"), "message was: {}", msg);
            assert!(msg.contains("max_attempts"), "message was: {}", msg);
        }
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_data_dir_from_toml_when_no_override() {
    env::remove_var(DATA_DIR_ENV);
    let config = FetchConfig::from_toml_str(FULL_CONFIG).unwrap();

    assert_eq!(
        resolve_data_dir(None, &config),
        PathBuf::from("/srv/hoopdata")
    );
}

#[test]
#[serial]
fn test_env_data_dir_beats_toml_but_not_cli() {
    let config = FetchConfig::from_toml_str(FULL_CONFIG).unwrap();
    env::set_var(DATA_DIR_ENV, "/tmp/from-env");

    assert_eq!(resolve_data_dir(None, &config), PathBuf::from("/tmp/from-env"));
    assert_eq!(
        resolve_data_dir(Some(PathBuf::from("/tmp/from-cli").as_path()), &config),
        PathBuf::from("/tmp/from-cli")
    );

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_blank_env_data_dir_is_ignored() {
    env::set_var(DATA_DIR_ENV, "   ");
    let config = FetchConfig::default();

    assert_eq!(resolve_data_dir(None, &config), default_data_dir());

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_config_file_found_through_env() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    std::fs::write(&path, "seasons = [\"2024-25\"]\n").unwrap();
    env::set_var(CONFIG_PATH_ENV, &path);

    let resolved = resolve_config_path(None);
    let config = FetchConfig::load(&resolved).unwrap();

    assert_eq!(resolved, path);
    assert_eq!(config.seasons, vec!["2024-25"]);

    env::remove_var(CONFIG_PATH_ENV);
}
