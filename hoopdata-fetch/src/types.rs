//! Core types for hoopdata-fetch
//!
//! Work units and partitions identify what to fetch; raw records, lineup
//! snapshots and enriched records carry what was fetched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Upstream team identifier, normalized to an integer
pub type TeamId = i64;

/// Upstream per-game event number (join key between the two sources)
pub type EventId = i64;

// ============================================================================
// Partitions and work units
// ============================================================================

/// Identifies one output dataset: one team within one season
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    /// Season label, e.g. "2023-24"
    pub season: String,
    /// Team abbreviation, e.g. "LAL"
    pub team_abbreviation: String,
}

impl PartitionKey {
    pub fn new(season: impl Into<String>, team_abbreviation: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            team_abbreviation: team_abbreviation.into(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.season, self.team_abbreviation)
    }
}

/// A partition plus what the sources need to enumerate its work units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub key: PartitionKey,
    /// Upstream season id, e.g. "22023" for the 2023-24 regular season
    pub season_id: String,
    pub team_id: TeamId,
    pub team_name: String,
}

/// Checkpoint identity of a work unit: one game for one team
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    pub game_id: String,
    pub team_id: TeamId,
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.game_id, self.team_id)
    }
}

impl FromStr for UnitKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (game_id, team_id) = s
            .rsplit_once('_')
            .ok_or_else(|| format!("unit key without separator: {}", s))?;
        if game_id.is_empty() {
            return Err(format!("unit key without game id: {}", s));
        }
        let team_id = team_id
            .parse()
            .map_err(|_| format!("unit key with non-numeric team id: {}", s))?;
        Ok(Self {
            game_id: game_id.to_string(),
            team_id,
        })
    }
}

/// One atomic fetch target
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub partition: PartitionKey,
    pub game_id: String,
    pub team_id: TeamId,
    /// Game date as reported by the game listing
    pub game_date: Option<String>,
    /// Matchup label, e.g. "LAL vs. DEN"
    pub matchup: Option<String>,
}

impl WorkUnit {
    pub fn new(partition: PartitionKey, game_id: impl Into<String>, team_id: TeamId) -> Self {
        Self {
            partition,
            game_id: game_id.into(),
            team_id,
            game_date: None,
            matchup: None,
        }
    }

    pub fn key(&self) -> UnitKey {
        UnitKey {
            game_id: self.game_id.clone(),
            team_id: self.team_id,
        }
    }

    /// Human-readable label for log lines
    pub fn label(&self) -> &str {
        self.matchup.as_deref().unwrap_or(&self.game_id)
    }
}

impl PartialEq for WorkUnit {
    fn eq(&self, other: &Self) -> bool {
        self.partition == other.partition
            && self.game_id == other.game_id
            && self.team_id == other.team_id
    }
}

impl Eq for WorkUnit {}

impl std::hash::Hash for WorkUnit {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.partition.hash(state);
        self.game_id.hash(state);
        self.team_id.hash(state);
    }
}

// ============================================================================
// Players and team id normalization
// ============================================================================

/// Player identifier as the upstream reports it (numeric or textual)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerId {
    Numeric(i64),
    Text(String),
}

impl From<i64> for PlayerId {
    fn from(id: i64) -> Self {
        PlayerId::Numeric(id)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        PlayerId::Text(id.to_string())
    }
}

/// Normalize an id that upstreams report inconsistently as string or integer
pub fn normalize_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => normalize_id_str(s),
        _ => None,
    }
}

/// Normalize a textual id ("1610612747", " 7 ", "7.0")
pub fn normalize_id_str(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

// ============================================================================
// Source records
// ============================================================================

/// One primary-source event, passed through unmodified
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEventRecord {
    /// Join key, if the record carried a parseable one
    pub event_id: Option<EventId>,
    pub fields: Map<String, Value>,
}

impl RawEventRecord {
    /// Build a record, reading its join key from `event_id_field`
    pub fn from_fields(fields: Map<String, Value>, event_id_field: &str) -> Self {
        let event_id = fields.get(event_id_field).and_then(normalize_id);
        Self { event_id, fields }
    }
}

/// One raw enrichment event as the lineup feed reports it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLineupEvent {
    /// Event number; string or integer depending on the feed
    #[serde(default, alias = "eventNum", alias = "event_number")]
    pub event_num: Option<Value>,
    /// Team id (as a string key) → players on court
    #[serde(default, alias = "currentPlayers")]
    pub current_players: Option<BTreeMap<String, Vec<PlayerId>>>,
}

/// On-court rosters by team, at one event
pub type TeamRosters = BTreeMap<TeamId, Vec<PlayerId>>;

/// Event id → team-partitioned rosters, for one work unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineupSnapshot {
    entries: HashMap<EventId, TeamRosters>,
}

impl LineupSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event_id: EventId, rosters: TeamRosters) {
        self.entries.insert(event_id, rosters);
    }

    pub fn get(&self, event_id: EventId) -> Option<&TeamRosters> {
        self.entries.get(&event_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Field names written alongside the source fields of each record
pub mod fields {
    pub const OWN_SIDE: &str = "teammates_on_court";
    pub const OTHER_SIDE: &str = "opponents_on_court";
    pub const SEASON: &str = "SEASON";
    pub const GAME_DATE: &str = "GAME_DATE";
}

/// A primary record joined with its lineup and partition metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(rename = "teammates_on_court", default)]
    pub own_side_on_court: Vec<PlayerId>,
    #[serde(rename = "opponents_on_court", default)]
    pub other_side_on_court: Vec<PlayerId>,
    #[serde(rename = "SEASON", default)]
    pub season: String,
    #[serde(rename = "GAME_DATE", default)]
    pub game_date: Option<String>,
    /// Source fields, minus the names above
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EnrichedRecord {
    /// Game the record was fetched for, when the source tagged it
    pub fn game_id(&self) -> Option<&str> {
        self.fields.get("GAME_ID").and_then(Value::as_str)
    }
}

// ============================================================================
// Fetch outcomes
// ============================================================================

/// Result of a fetch as the orchestrator sees it
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// Upstream returned data
    Success(T),
    /// Upstream legitimately had nothing
    Empty,
    /// Best-effort source could not serve this unit
    Unavailable(String),
    /// Retried source failed on every attempt
    Error(String),
}

impl<T> FetchOutcome<Vec<T>> {
    /// `Success` for a non-empty list, `Empty` otherwise
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Success(items)
        }
    }

    /// Items on success, nothing for every other outcome
    pub fn into_items(self) -> Vec<T> {
        match self {
            FetchOutcome::Success(items) => items,
            _ => Vec::new(),
        }
    }
}
