//! External collaborators
//!
//! The pipeline only talks to upstreams through these traits. The HTTP
//! implementations live in the submodules; tests substitute in-memory fakes.

pub mod lineup_feed;
pub mod stats_api;
pub mod teams;

pub use lineup_feed::LineupFeedClient;
pub use stats_api::StatsApiClient;
pub use teams::StaticPartitionSource;

use crate::error::{EnrichmentUnavailable, FetchError};
use crate::types::{Partition, RawEventRecord, RawLineupEvent, WorkUnit};
use std::sync::Arc;

/// Enumerates partitions in a stable order
#[async_trait::async_trait]
pub trait PartitionSource: Send + Sync {
    async fn list_partitions(&self) -> Result<Vec<Partition>, FetchError>;
}

/// Enumerates the work units of one partition, in processing order
#[async_trait::async_trait]
pub trait GameSource: Send + Sync {
    async fn list_work_units(&self, partition: &Partition) -> Result<Vec<WorkUnit>, FetchError>;
}

/// Required, retried upstream providing the main event records
///
/// Returns an empty list when the upstream legitimately has no data, which
/// is distinct from failure.
#[async_trait::async_trait]
pub trait PrimarySource: Send + Sync {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<RawEventRecord>, FetchError>;
}

/// Best-effort upstream providing per-event lineups
#[async_trait::async_trait]
pub trait EnrichmentSource: Send + Sync {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<RawLineupEvent>, EnrichmentUnavailable>;
}

/// The four collaborators a pipeline run needs
#[derive(Clone)]
pub struct Sources {
    pub partitions: Arc<dyn PartitionSource>,
    pub games: Arc<dyn GameSource>,
    pub primary: Arc<dyn PrimarySource>,
    pub enrichment: Arc<dyn EnrichmentSource>,
}

impl Sources {
    /// Live upstream clients configured from `config`
    pub fn http(config: &hoopdata_common::FetchConfig) -> crate::error::PipelineResult<Self> {
        let stats = Arc::new(StatsApiClient::new(
            config.http.stats_base_url.clone(),
            config.http_timeout(),
        )?);
        let lineups = LineupFeedClient::new(config.http.lineup_url_template.clone(), config.http_timeout())?;

        Ok(Self {
            partitions: Arc::new(StaticPartitionSource::new(config.seasons.clone())),
            games: stats.clone(),
            primary: stats,
            enrichment: Arc::new(lineups),
        })
    }
}
