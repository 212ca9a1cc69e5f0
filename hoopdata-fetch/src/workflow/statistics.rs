//! Run statistics
//!
//! Counters owned by the orchestrator, reported as the run proceeds and
//! returned to the caller at the end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every partition was enumerated
    #[default]
    Exhausted,
    /// The configured unit ceiling was reached
    LimitReached,
    /// An external stop signal was honored between units
    Cancelled,
}

/// Per-partition counters, reset at each partition start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionStats {
    pub units_processed: usize,
    pub units_skipped: usize,
    pub records_accrued: usize,
}

/// Whole-run counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Units fetched, joined and checkpointed in this run
    pub units_processed: usize,
    /// Units skipped because a checkpoint already existed
    pub units_skipped: usize,
    /// Enriched records appended to datasets in this run
    pub records_accrued: usize,
    /// Units whose primary fetch succeeded with no records
    pub primary_empty: usize,
    /// Units whose primary fetch failed on every attempt
    pub primary_exhausted: usize,
    /// Units for which the enrichment source was unavailable
    pub enrichment_unavailable: usize,
    /// Lineup entries dropped because they could not be keyed
    pub malformed_lineup_entries: usize,
    /// Partitions whose game listing yielded nothing
    pub partitions_without_units: usize,
    pub partitions_flushed: usize,
    pub batch_rests: usize,
    pub stop_reason: StopReason,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            units_processed: 0,
            units_skipped: 0,
            records_accrued: 0,
            primary_empty: 0,
            primary_exhausted: 0,
            enrichment_unavailable: 0,
            malformed_lineup_entries: 0,
            partitions_without_units: 0,
            partitions_flushed: 0,
            batch_rests: 0,
            stop_reason: StopReason::default(),
        }
    }
}

impl RunStats {
    pub fn finish(&mut self, reason: StopReason) {
        self.stop_reason = reason;
        self.finished_at = Some(Utc::now());
    }

    pub fn elapsed_seconds(&self) -> i64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds()
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} units processed ({} skipped), {} records, {} exhausted, {} without lineups, {} partitions saved",
            self.units_processed,
            self.units_skipped,
            self.records_accrued,
            self.primary_exhausted,
            self.enrichment_unavailable,
            self.partitions_flushed
        )
    }
}
