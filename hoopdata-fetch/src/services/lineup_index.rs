//! Lineup index builder
//!
//! Turns the enrichment source's raw event stream for one game into a
//! `LineupSnapshot` keyed by event number. Team keys are normalized to
//! integers here so the joiner can stay total.

use crate::types::{normalize_id, normalize_id_str, LineupSnapshot, RawLineupEvent, TeamRosters};

/// Snapshot for one work unit plus the entries that had to be dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineupIndex {
    pub snapshot: LineupSnapshot,
    /// Events carrying rosters that could not be keyed (bad event number or team id)
    pub malformed: usize,
}

impl LineupIndex {
    /// Snapshot used when the enrichment source had nothing for the unit
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index an ordered event stream; a later event with the same number wins
    pub fn build(events: &[RawLineupEvent]) -> Self {
        let mut index = Self::default();

        for event in events {
            let Some(players) = &event.current_players else {
                continue;
            };

            let Some(event_id) = event.event_num.as_ref().and_then(normalize_id) else {
                tracing::debug!(event_num = ?event.event_num, "Lineup event without usable event number");
                index.malformed += 1;
                continue;
            };

            let rosters: Option<TeamRosters> = players
                .iter()
                .map(|(team, roster)| normalize_id_str(team).map(|id| (id, roster.clone())))
                .collect();

            match rosters {
                Some(rosters) => index.snapshot.insert(event_id, rosters),
                None => {
                    tracing::debug!(event_id, "Lineup event with unparseable team key");
                    index.malformed += 1;
                }
            }
        }

        index
    }
}
