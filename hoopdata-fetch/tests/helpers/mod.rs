//! Test Helper Utilities
//!
//! In-memory upstreams for driving the orchestrator without a network. Every
//! fake counts its calls so tests can assert exactly what went outbound.

#![allow(dead_code)]

use async_trait::async_trait;
use hoopdata_fetch::error::{EnrichmentUnavailable, FetchError};
use hoopdata_fetch::sources::{EnrichmentSource, GameSource, PartitionSource, PrimarySource, Sources};
use hoopdata_fetch::types::{Partition, PartitionKey, PlayerId, RawEventRecord, RawLineupEvent, WorkUnit};
use hoopdata_fetch::PipelineConfig;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

pub const LAL: i64 = 1610612747;
pub const DEN: i64 = 1610612743;
pub const BOS: i64 = 1610612738;

/// Route pipeline logs through the test harness (`RUST_LOG=debug cargo test`)
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Builders
// ============================================================================

pub fn partition(season: &str, abbr: &str, team_id: i64) -> Partition {
    Partition {
        key: PartitionKey::new(season, abbr),
        season_id: format!("2{}", &season[..4]),
        team_id,
        team_name: abbr.to_string(),
    }
}

pub fn unit(partition: &Partition, game_id: &str) -> WorkUnit {
    let mut unit = WorkUnit::new(partition.key.clone(), game_id, partition.team_id);
    unit.game_date = Some("2023-10-24".to_string());
    unit.matchup = Some(format!("{} vs. OPP", partition.key.team_abbreviation));
    unit
}

/// Shot record with the given event id, tagged with its game
pub fn shot(game_id: &str, event_id: i64) -> RawEventRecord {
    let mut fields = Map::new();
    fields.insert("GAME_ID".to_string(), json!(game_id));
    fields.insert("GAME_EVENT_ID".to_string(), json!(event_id));
    fields.insert("LOC_X".to_string(), json!(-40));
    fields.insert("LOC_Y".to_string(), json!(112));
    fields.insert("SHOT_MADE_FLAG".to_string(), json!(1));
    RawEventRecord::from_fields(fields, "GAME_EVENT_ID")
}

pub fn shots(game_id: &str, count: i64) -> Vec<RawEventRecord> {
    (1..=count).map(|event_id| shot(game_id, event_id)).collect()
}

/// Lineup event as the feed reports it: string event number, string team keys
pub fn lineup(event_num: i64, teams: &[(i64, Vec<i64>)]) -> RawLineupEvent {
    let current_players: BTreeMap<String, Vec<PlayerId>> = teams
        .iter()
        .map(|(team_id, players)| {
            (
                team_id.to_string(),
                players.iter().map(|p| PlayerId::from(*p)).collect(),
            )
        })
        .collect();
    RawLineupEvent {
        event_num: Some(Value::String(event_num.to_string())),
        current_players: Some(current_players),
    }
}

/// Production pacing values; tests run on a paused clock so waits cost nothing
pub fn test_config() -> PipelineConfig {
    PipelineConfig::default()
}

// ============================================================================
// Fakes
// ============================================================================

pub struct FakePartitions {
    partitions: Vec<Partition>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl PartitionSource for FakePartitions {
    async fn list_partitions(&self) -> Result<Vec<Partition>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.partitions.clone())
    }
}

pub struct FakeGames {
    units: HashMap<PartitionKey, Vec<WorkUnit>>,
    failing: Vec<PartitionKey>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl GameSource for FakeGames {
    async fn list_work_units(&self, partition: &Partition) -> Result<Vec<WorkUnit>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&partition.key) {
            return Err(FetchError::Timeout);
        }
        Ok(self.units.get(&partition.key).cloned().unwrap_or_default())
    }
}

/// Scripted primary response for one game
#[derive(Clone)]
pub enum PrimaryScript {
    Records(Vec<RawEventRecord>),
    Empty,
    /// Fails on every attempt
    AlwaysFail,
    /// Fails this many attempts, then returns the records
    FailThen(usize, Vec<RawEventRecord>),
}

type FetchHook = Box<dyn Fn(&WorkUnit) + Send + Sync>;

pub struct FakePrimary {
    scripts: Mutex<HashMap<String, PrimaryScript>>,
    hooks: Mutex<HashMap<String, FetchHook>>,
    log: Mutex<Vec<(String, Instant)>>,
}

impl FakePrimary {
    /// Game ids fetched, in call order (retries included)
    pub fn fetched(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// Run `hook` whenever `game_id` is fetched
    pub fn on_fetch(&self, game_id: &str, hook: impl Fn(&WorkUnit) + Send + Sync + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .insert(game_id.to_string(), Box::new(hook));
    }
}

#[async_trait]
impl PrimarySource for FakePrimary {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<RawEventRecord>, FetchError> {
        self.log
            .lock()
            .unwrap()
            .push((unit.game_id.clone(), Instant::now()));
        if let Some(hook) = self.hooks.lock().unwrap().get(&unit.game_id) {
            hook(unit);
        }

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&unit.game_id) {
            None | Some(PrimaryScript::Empty) => Ok(Vec::new()),
            Some(PrimaryScript::Records(records)) => Ok(records.clone()),
            Some(PrimaryScript::AlwaysFail) => Err(FetchError::Api(500, "upstream down".to_string())),
            Some(PrimaryScript::FailThen(remaining, records)) => {
                if *remaining > 0 {
                    *remaining -= 1;
                    Err(FetchError::RateLimited)
                } else {
                    Ok(records.clone())
                }
            }
        }
    }
}

pub struct FakeEnrichment {
    feeds: HashMap<String, Result<Vec<RawLineupEvent>, String>>,
    log: Mutex<Vec<(String, Instant)>>,
}

impl FakeEnrichment {
    pub fn calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl EnrichmentSource for FakeEnrichment {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<RawLineupEvent>, EnrichmentUnavailable> {
        self.log
            .lock()
            .unwrap()
            .push((unit.game_id.clone(), Instant::now()));
        match self.feeds.get(&unit.game_id) {
            Some(Ok(events)) => Ok(events.clone()),
            Some(Err(reason)) => Err(EnrichmentUnavailable(reason.clone())),
            None => Err(EnrichmentUnavailable("no lineup data".to_string())),
        }
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// Scripted upstream world, built once per test
#[derive(Default)]
pub struct Upstream {
    partitions: Vec<Partition>,
    units: HashMap<PartitionKey, Vec<WorkUnit>>,
    failing_listings: Vec<PartitionKey>,
    primary: HashMap<String, PrimaryScript>,
    enrichment: HashMap<String, Result<Vec<RawLineupEvent>, String>>,
}

impl Upstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partition with its games, each scripted with `shots_per_game` shots
    pub fn partition_with_games(mut self, partition: Partition, game_ids: &[&str], shots_per_game: i64) -> Self {
        let units: Vec<WorkUnit> = game_ids.iter().map(|id| unit(&partition, id)).collect();
        for id in game_ids {
            self.primary
                .insert(id.to_string(), PrimaryScript::Records(shots(id, shots_per_game)));
        }
        self.units.insert(partition.key.clone(), units);
        self.partitions.push(partition);
        self
    }

    pub fn failing_listing(mut self, partition: Partition) -> Self {
        self.failing_listings.push(partition.key.clone());
        self.partitions.push(partition);
        self
    }

    pub fn primary(mut self, game_id: &str, script: PrimaryScript) -> Self {
        self.primary.insert(game_id.to_string(), script);
        self
    }

    pub fn lineups(mut self, game_id: &str, events: Vec<RawLineupEvent>) -> Self {
        self.enrichment.insert(game_id.to_string(), Ok(events));
        self
    }

    pub fn lineups_unavailable(mut self, game_id: &str) -> Self {
        self.enrichment
            .insert(game_id.to_string(), Err("503 from feed".to_string()));
        self
    }

    pub fn build(self) -> Fixture {
        let partitions = Arc::new(FakePartitions {
            partitions: self.partitions,
            calls: AtomicUsize::new(0),
        });
        let games = Arc::new(FakeGames {
            units: self.units,
            failing: self.failing_listings,
            calls: AtomicUsize::new(0),
        });
        let primary = Arc::new(FakePrimary {
            scripts: Mutex::new(self.primary),
            hooks: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        });
        let enrichment = Arc::new(FakeEnrichment {
            feeds: self.enrichment,
            log: Mutex::new(Vec::new()),
        });

        let sources = Sources {
            partitions: partitions.clone(),
            games: games.clone(),
            primary: primary.clone(),
            enrichment: enrichment.clone(),
        };

        Fixture {
            sources,
            partitions,
            games,
            primary,
            enrichment,
        }
    }
}

pub struct Fixture {
    pub sources: Sources,
    pub partitions: Arc<FakePartitions>,
    pub games: Arc<FakeGames>,
    pub primary: Arc<FakePrimary>,
    pub enrichment: Arc<FakeEnrichment>,
}

impl Fixture {
    pub fn game_listings(&self) -> usize {
        self.games.calls.load(Ordering::SeqCst)
    }
}

/// GAME_ID of every record in a persisted dataset, in order
pub fn dataset_game_ids(records: &[hoopdata_fetch::types::EnrichedRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.fields["GAME_ID"].as_str().unwrap_or_default().to_string())
        .collect()
}
