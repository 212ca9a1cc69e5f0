//! hoopdata-fetch library interface
//!
//! Collects per-game shot records from the stats API, joins each shot with
//! the players on court from the lineup feed, and accumulates the result
//! into one dataset per team-season. Runs are checkpointed per game so an
//! interrupted run resumes without refetching or duplicating anything.

pub mod error;
pub mod services;
pub mod sources;
pub mod types;
pub mod utils;
pub mod workflow;

pub use crate::error::{EnrichmentUnavailable, FetchError, PipelineError, PipelineResult};
pub use crate::sources::Sources;
pub use crate::workflow::{Orchestrator, PipelineConfig, RunStats, StopReason};
