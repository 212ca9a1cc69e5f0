//! Pipeline Orchestrator
//!
//! Drives a run top-down: partitions → work units → (primary records,
//! lineup snapshot) → joined records → partition dataset → disk.
//!
//! # Per-unit sequence
//! 1. Skip the unit if it is already checkpointed (no outbound calls)
//! 2. Throttle, then fetch primary records with retry/backoff
//! 3. Throttle, then fetch lineups once (best-effort) and index them
//! 4. Join every primary record and append to the in-memory dataset
//! 5. Commit the unit's checkpoint
//! 6. Update counters, honor the unit ceiling, take a batch rest if due
//!
//! # Error Handling
//! - Source failures are absorbed here: an exhausted primary fetch or an
//!   unavailable lineup feed degrades to "no data" and the run continues
//! - Checkpoint and dataset write failures abort the run immediately. A
//!   failed checkpoint commit first rolls the dataset back to the units that
//!   were committed, so a rerun never accrues the failed unit twice
//! - A loaded dataset is cut back to its checkpointed games before any unit
//!   runs, which covers a crash between a unit's flush and its checkpoint
//!
//! # Cancellation
//! The stop signal is checked between units only. The current partition is
//! still flushed before the run returns.

use super::statistics::{PartitionStats, RunStats, StopReason};
use crate::error::PipelineResult;
use crate::services::{CheckpointStore, EventJoiner, LineupIndex, PartitionAccumulator, Throttler};
use crate::sources::Sources;
use crate::types::{EnrichedRecord, FetchOutcome, Partition, UnitKey, WorkUnit};
use crate::utils::RetryPolicy;
use hoopdata_common::{FetchConfig, FlushPolicy};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Checkpoint file name under the data directory
pub const CHECKPOINT_FILE: &str = "progress.json";
/// Dataset directory name under the data directory
pub const DATASET_DIR: &str = "shots_by_season";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Minimum spacing between upstream calls
    pub request_delay: Duration,
    /// Completed units between extended rests (0 disables rests)
    pub batch_rest_interval: u32,
    pub batch_rest_duration: Duration,
    /// Primary fetch attempts per unit
    pub max_attempts: u32,
    /// First backoff interval; doubles per failed attempt
    pub backoff_base: Duration,
    /// Stop after this many processed units
    pub unit_limit: Option<u32>,
    pub flush_policy: FlushPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for PipelineConfig {
    fn from(config: &FetchConfig) -> Self {
        Self {
            request_delay: config.request_delay(),
            batch_rest_interval: config.pacing.batch_rest_interval,
            batch_rest_duration: config.batch_rest_duration(),
            max_attempts: config.retry.max_attempts,
            backoff_base: config.backoff_base(),
            unit_limit: config.unit_limit,
            flush_policy: config.flush_policy,
        }
    }
}

/// Pipeline orchestrator
pub struct Orchestrator {
    config: PipelineConfig,
    sources: Sources,
    throttler: Throttler,
    retry: RetryPolicy,
    checkpoints: CheckpointStore,
    accumulator: PartitionAccumulator,
    stats: RunStats,
}

impl Orchestrator {
    pub fn new(
        config: PipelineConfig,
        sources: Sources,
        checkpoints: CheckpointStore,
        accumulator: PartitionAccumulator,
    ) -> Self {
        let throttler = Throttler::new(
            config.request_delay,
            config.batch_rest_interval,
            config.batch_rest_duration,
        );
        let retry = RetryPolicy::new(config.max_attempts, config.backoff_base);

        Self {
            config,
            sources,
            throttler,
            retry,
            checkpoints,
            accumulator,
            stats: RunStats::default(),
        }
    }

    /// Orchestrator persisting under `data_dir` (checkpoint + datasets)
    pub fn open(config: PipelineConfig, sources: Sources, data_dir: &Path) -> PipelineResult<Self> {
        let checkpoints = CheckpointStore::load(data_dir.join(CHECKPOINT_FILE))?;
        let accumulator = PartitionAccumulator::new(data_dir.join(DATASET_DIR));
        Ok(Self::new(config, sources, checkpoints, accumulator))
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub fn accumulator(&self) -> &PartitionAccumulator {
        &self.accumulator
    }

    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    /// Run until every partition is done, the ceiling is hit, or `cancel` fires
    ///
    /// # Returns
    /// Run statistics; `Err` only for persistence failures
    pub async fn run(&mut self, cancel: &CancellationToken) -> PipelineResult<RunStats> {
        self.stats = RunStats::default();

        let partitions = match self.sources.partitions.list_partitions().await {
            Ok(partitions) => partitions,
            Err(err) => {
                warn!(error = %err, "Partition listing failed, nothing to do");
                Vec::new()
            }
        };
        info!(partitions = partitions.len(), "Found {} partitions", partitions.len());

        let mut stop = StopReason::Exhausted;
        for partition in &partitions {
            if cancel.is_cancelled() {
                stop = StopReason::Cancelled;
                break;
            }

            match self.run_partition(partition, cancel).await {
                Ok(None) => {}
                Ok(Some(reason)) => {
                    stop = reason;
                    break;
                }
                Err(err) => {
                    error!(
                        partition = %partition.key,
                        error = %err,
                        "Persistence failure, aborting run"
                    );
                    return Err(err);
                }
            }
        }

        self.stats.finish(stop);
        info!(
            stop_reason = ?stop,
            elapsed_secs = self.stats.elapsed_seconds(),
            "Run complete: {}",
            self.stats.display_string()
        );
        Ok(self.stats.clone())
    }

    async fn run_partition(
        &mut self,
        partition: &Partition,
        cancel: &CancellationToken,
    ) -> PipelineResult<Option<StopReason>> {
        info!(
            partition = %partition.key,
            "[{}] {} ({})",
            partition.key.team_abbreviation,
            partition.team_name,
            partition.key.season
        );

        let units = self.list_units(partition).await;
        if units.is_empty() {
            info!(partition = %partition.key, "No games found");
            self.stats.partitions_without_units += 1;
            return Ok(None);
        }
        info!(partition = %partition.key, games = units.len(), "Found {} games", units.len());

        let mut dataset = self.accumulator.load(&partition.key)?;
        let orphaned = self.accumulator.retain_committed(&mut dataset, |game_id| {
            self.checkpoints.contains(&UnitKey {
                game_id: game_id.to_string(),
                team_id: partition.team_id,
            })
        });
        if orphaned > 0 {
            warn!(
                partition = %partition.key,
                records = orphaned,
                "Dropped records of games without a checkpoint"
            );
            self.accumulator.flush(&mut dataset)?;
        }
        let mut partition_stats = PartitionStats::default();
        let mut stop = None;

        for unit in &units {
            if cancel.is_cancelled() {
                info!(partition = %partition.key, "Stop requested, finishing partition");
                stop = Some(StopReason::Cancelled);
                break;
            }

            let key = unit.key();
            if self.checkpoints.contains(&key) {
                debug!(unit = %key, "Skipping {} (already done)", unit.game_id);
                partition_stats.units_skipped += 1;
                self.stats.units_skipped += 1;
                continue;
            }

            if self.limit_reached() {
                stop = Some(StopReason::LimitReached);
                break;
            }

            let records = self.process_unit(unit).await;
            let accrued = records.len();
            let committed_len = dataset.len();
            self.accumulator.append(&mut dataset, records);

            if self.config.flush_policy == FlushPolicy::Unit {
                self.accumulator.flush(&mut dataset)?;
            }
            if let Err(err) = self.checkpoints.mark_complete(&key) {
                // Unit stays uncheckpointed, so its records must not stay on disk
                self.accumulator.rollback(&mut dataset, committed_len);
                return Err(err.into());
            }

            partition_stats.units_processed += 1;
            partition_stats.records_accrued += accrued;
            self.stats.units_processed += 1;
            self.stats.records_accrued += accrued;
            info!(
                unit = %key,
                records = accrued,
                total_records = self.stats.records_accrued,
                units_processed = self.stats.units_processed,
                "Got {} records (Total: {})",
                accrued,
                self.stats.records_accrued
            );

            if self.limit_reached() {
                info!(
                    units_processed = self.stats.units_processed,
                    "Unit limit reached, stopping"
                );
                stop = Some(StopReason::LimitReached);
                break;
            }

            if self.throttler.unit_completed().await {
                self.stats.batch_rests += 1;
            }
        }

        if partition_stats.units_processed > 0 {
            if self.config.flush_policy == FlushPolicy::Partition || dataset.unflushed() > 0 {
                self.accumulator.flush(&mut dataset)?;
            }
            self.stats.partitions_flushed += 1;
        }

        info!(
            partition = %partition.key,
            processed = partition_stats.units_processed,
            skipped = partition_stats.units_skipped,
            records = partition_stats.records_accrued,
            dataset_records = dataset.len(),
            "Partition done"
        );

        Ok(stop)
    }

    /// Work units for a partition; a failed listing yields none
    async fn list_units(&self, partition: &Partition) -> Vec<WorkUnit> {
        self.throttler.wait_before_call().await;

        let operation = format!("game list {}", partition.key);
        match self
            .retry
            .execute(&operation, || self.sources.games.list_work_units(partition))
            .await
        {
            FetchOutcome::Error(msg) => {
                warn!(partition = %partition.key, error = %msg, "Error fetching games");
                Vec::new()
            }
            outcome => outcome.into_items(),
        }
    }

    /// Fetch, index and join one unit; never fails
    async fn process_unit(&mut self, unit: &WorkUnit) -> Vec<EnrichedRecord> {
        info!(unit = %unit.key(), "Processing {} ({})", unit.label(), unit.game_id);

        self.throttler.wait_before_call().await;
        let operation = format!("shot chart {}", unit.game_id);
        let primary = match self
            .retry
            .execute(&operation, || self.sources.primary.fetch(unit))
            .await
        {
            FetchOutcome::Success(records) => FetchOutcome::from_items(records),
            other => other,
        };

        let records = match primary {
            FetchOutcome::Success(records) => records,
            FetchOutcome::Empty => {
                info!(unit = %unit.key(), "No shots data for {}", unit.game_id);
                self.stats.primary_empty += 1;
                return Vec::new();
            }
            FetchOutcome::Error(msg) => {
                warn!(unit = %unit.key(), error = %msg, "Giving up on {} for this run", unit.game_id);
                self.stats.primary_exhausted += 1;
                return Vec::new();
            }
            FetchOutcome::Unavailable(_) => return Vec::new(),
        };

        self.throttler.wait_before_call().await;
        let enrichment = match self.sources.enrichment.fetch(unit).await {
            Ok(events) => FetchOutcome::from_items(events),
            Err(unavailable) => FetchOutcome::Unavailable(unavailable.0),
        };

        let index = match enrichment {
            FetchOutcome::Success(events) => LineupIndex::build(&events),
            FetchOutcome::Unavailable(reason) => {
                debug!(unit = %unit.key(), reason = %reason, "Lineups unavailable");
                self.stats.enrichment_unavailable += 1;
                LineupIndex::empty()
            }
            FetchOutcome::Empty | FetchOutcome::Error(_) => LineupIndex::empty(),
        };

        if index.malformed > 0 {
            warn!(
                unit = %unit.key(),
                malformed = index.malformed,
                "Dropped lineup entries without usable keys"
            );
            self.stats.malformed_lineup_entries += index.malformed;
        }

        EventJoiner::for_unit(unit).join_all(records, &index.snapshot)
    }

    fn limit_reached(&self) -> bool {
        self.config
            .unit_limit
            .is_some_and(|limit| self.stats.units_processed >= limit as usize)
    }
}
