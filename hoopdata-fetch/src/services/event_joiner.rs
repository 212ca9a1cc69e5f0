//! Primary record + lineup join

use crate::types::{fields, EnrichedRecord, LineupSnapshot, PlayerId, RawEventRecord, TeamId, WorkUnit};

/// Joins a unit's primary records against its lineup snapshot
///
/// The roster keyed by `own_team_id` becomes the own side; every other
/// roster, in team id order, is concatenated into the other side. Records
/// with no snapshot entry get two empty lists. Joining never fails.
#[derive(Debug, Clone)]
pub struct EventJoiner {
    own_team_id: TeamId,
    season: String,
    game_date: Option<String>,
}

impl EventJoiner {
    pub fn new(own_team_id: TeamId, season: impl Into<String>, game_date: Option<String>) -> Self {
        Self {
            own_team_id,
            season: season.into(),
            game_date,
        }
    }

    /// Joiner carrying the unit's team and partition metadata
    pub fn for_unit(unit: &WorkUnit) -> Self {
        Self::new(unit.team_id, unit.partition.season.clone(), unit.game_date.clone())
    }

    pub fn join(&self, record: RawEventRecord, snapshot: &LineupSnapshot) -> EnrichedRecord {
        let mut own_side: Vec<PlayerId> = Vec::new();
        let mut other_side: Vec<PlayerId> = Vec::new();

        if let Some(rosters) = record.event_id.and_then(|id| snapshot.get(id)) {
            for (team_id, players) in rosters {
                if *team_id == self.own_team_id {
                    own_side = players.clone();
                } else {
                    other_side.extend(players.iter().cloned());
                }
            }
        }

        let mut source_fields = record.fields;
        for name in [fields::OWN_SIDE, fields::OTHER_SIDE, fields::SEASON] {
            source_fields.remove(name);
        }
        // Listing date wins; fall back to whatever the record carried
        let record_date = source_fields
            .remove(fields::GAME_DATE)
            .and_then(|v| v.as_str().map(str::to_string));

        EnrichedRecord {
            own_side_on_court: own_side,
            other_side_on_court: other_side,
            season: self.season.clone(),
            game_date: self.game_date.clone().or(record_date),
            fields: source_fields,
        }
    }

    pub fn join_all(&self, records: Vec<RawEventRecord>, snapshot: &LineupSnapshot) -> Vec<EnrichedRecord> {
        records
            .into_iter()
            .map(|record| self.join(record, snapshot))
            .collect()
    }
}
