//! Checkpointed fetch-and-join workflow
//!
//! Partitions are processed strictly in order, and the work units within a
//! partition strictly in order: the upstream rate limit is global, so there
//! is nothing to gain from concurrency.

pub mod orchestrator;
pub mod statistics;

pub use orchestrator::{Orchestrator, PipelineConfig, CHECKPOINT_FILE, DATASET_DIR};
pub use statistics::{PartitionStats, RunStats, StopReason};
