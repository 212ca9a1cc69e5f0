//! Per-partition output datasets
//!
//! A dataset is loaded once when its partition starts, grown in memory unit
//! by unit, and rewritten in full on flush.

use crate::types::{EnrichedRecord, PartitionKey};
use hoopdata_common::storage::{read_json, write_json_atomic};
use hoopdata_common::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Accumulated records for one partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionDataset {
    pub key: PartitionKey,
    records: Vec<EnrichedRecord>,
    /// Records appended since the last load or flush
    unflushed: usize,
}

impl PartitionDataset {
    pub fn new(key: PartitionKey) -> Self {
        Self {
            key,
            records: Vec::new(),
            unflushed: 0,
        }
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unflushed(&self) -> usize {
        self.unflushed
    }
}

/// Loads and persists partition datasets under one directory
#[derive(Debug, Clone)]
pub struct PartitionAccumulator {
    output_dir: PathBuf,
}

impl PartitionAccumulator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File holding the dataset for `key`, e.g. `2023-24_LAL.json`
    pub fn dataset_path(&self, key: &PartitionKey) -> PathBuf {
        self.output_dir.join(format!("{}.json", key))
    }

    /// Read the persisted dataset, or start an empty one
    pub fn load(&self, key: &PartitionKey) -> Result<PartitionDataset> {
        let records: Vec<EnrichedRecord> = read_json(&self.dataset_path(key))?.unwrap_or_default();
        if !records.is_empty() {
            info!(partition = %key, records = records.len(), "Loaded existing dataset");
        }
        Ok(PartitionDataset {
            key: key.clone(),
            records,
            unflushed: 0,
        })
    }

    /// Extend the dataset in memory only
    pub fn append(&self, dataset: &mut PartitionDataset, records: Vec<EnrichedRecord>) {
        dataset.unflushed += records.len();
        dataset.records.extend(records);
    }

    /// Overwrite the persisted dataset with the in-memory one
    pub fn flush(&self, dataset: &mut PartitionDataset) -> Result<()> {
        let path = self.dataset_path(&dataset.key);
        write_json_atomic(&path, &dataset.records, false)?;
        info!(
            partition = %dataset.key,
            records = dataset.records.len(),
            path = %path.display(),
            "Saved {} records",
            dataset.records.len()
        );
        dataset.unflushed = 0;
        Ok(())
    }

    /// Drop records past `len` and persist what remains
    ///
    /// Used when the unit that appended those records could not be
    /// checkpointed. A failed write is logged only; the caller is already
    /// returning a persistence error.
    pub fn rollback(&self, dataset: &mut PartitionDataset, len: usize) {
        let dropped = dataset.records.len().saturating_sub(len);
        dataset.records.truncate(len);
        dataset.unflushed = dataset.unflushed.saturating_sub(dropped);

        if let Err(err) = self.flush(dataset) {
            warn!(
                partition = %dataset.key,
                error = %err,
                "Could not persist rolled-back dataset"
            );
        }
    }

    /// Drop records of games that `committed` does not accept
    ///
    /// Under per-unit flushing a unit's records reach disk before its
    /// checkpoint, so a crash between the two writes leaves records of an
    /// uncommitted unit behind. Records without a `GAME_ID` are kept.
    ///
    /// # Returns
    /// Number of records dropped
    pub fn retain_committed(
        &self,
        dataset: &mut PartitionDataset,
        committed: impl Fn(&str) -> bool,
    ) -> usize {
        let before = dataset.records.len();
        dataset
            .records
            .retain(|record| record.game_id().map_or(true, |game_id| committed(game_id)));
        before - dataset.records.len()
    }
}
