//! Service modules for the fetch-and-join pipeline

pub mod checkpoint_store;
pub mod event_joiner;
pub mod lineup_index;
pub mod partition_accumulator;
pub mod throttler;

pub use checkpoint_store::CheckpointStore;
pub use event_joiner::EventJoiner;
pub use lineup_index::LineupIndex;
pub use partition_accumulator::{PartitionAccumulator, PartitionDataset};
pub use throttler::Throttler;
