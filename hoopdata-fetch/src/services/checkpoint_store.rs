//! Completed work-unit checkpoints
//!
//! The full set is rewritten (atomically) after every newly completed unit,
//! so a crash loses at most the in-flight unit's checkpoint.

use crate::types::UnitKey;
use hoopdata_common::storage::{read_json, write_json_atomic};
use hoopdata_common::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// On-disk checkpoint layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    #[serde(rename = "completedUnits", alias = "completed_games", default)]
    completed_units: Vec<String>,
}

/// Durable set of completed work units
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    completed: BTreeSet<String>,
}

impl CheckpointStore {
    /// Reconstruct the set from the last persisted snapshot, or start empty
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file: CheckpointFile = read_json(&path)?.unwrap_or_default();

        let mut completed = BTreeSet::new();
        for entry in file.completed_units {
            if entry.parse::<UnitKey>().is_err() {
                warn!(entry = %entry, "Checkpoint entry is not a game/team key, keeping verbatim");
            }
            completed.insert(entry);
        }

        info!(
            path = %path.display(),
            completed = completed.len(),
            "Loaded checkpoint state"
        );

        Ok(Self { path, completed })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &UnitKey) -> bool {
        self.completed.contains(&key.to_string())
    }

    /// Add `key` and persist the whole set
    ///
    /// A key that is already present is a no-op (nothing is written). On a
    /// write failure the key is dropped again so memory matches disk, and the
    /// error is returned for the caller to abort on.
    pub fn mark_complete(&mut self, key: &UnitKey) -> Result<()> {
        let entry = key.to_string();
        if !self.completed.insert(entry.clone()) {
            return Ok(());
        }

        if let Err(err) = self.persist() {
            self.completed.remove(&entry);
            return Err(err);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let file = CheckpointFile {
            completed_units: self.completed.iter().cloned().collect(),
        };
        write_json_atomic(&self.path, &file, true)
    }
}
