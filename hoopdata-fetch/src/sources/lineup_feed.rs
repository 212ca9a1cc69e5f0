//! Lineup feed client
//!
//! Fetches the per-game event feed that carries the players on court at each
//! event. The feed is best-effort: any transport, status or decode failure
//! is reported as `EnrichmentUnavailable` and never retried.

use super::EnrichmentSource;
use crate::error::EnrichmentUnavailable;
use crate::types::{RawLineupEvent, WorkUnit};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = "hoopdata/0.1.0";

/// Feed envelope
#[derive(Debug, Clone, Deserialize)]
pub struct LineupFeed {
    #[serde(default)]
    pub events: Vec<RawLineupEvent>,
}

/// Lineup feed client
pub struct LineupFeedClient {
    http_client: reqwest::Client,
    url_template: String,
}

impl LineupFeedClient {
    /// `url_template` must contain `{game_id}`
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, EnrichmentUnavailable> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentUnavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            url_template: url_template.into(),
        })
    }

    pub fn url_for(&self, game_id: &str) -> String {
        self.url_template.replace("{game_id}", game_id)
    }
}

#[async_trait::async_trait]
impl EnrichmentSource for LineupFeedClient {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<RawLineupEvent>, EnrichmentUnavailable> {
        let url = self.url_for(&unit.game_id);
        tracing::debug!(game_id = %unit.game_id, url = %url, "Querying lineup feed");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichmentUnavailable(format!("network: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentUnavailable(format!("status {}", status.as_u16())));
        }

        let feed: LineupFeed = response
            .json()
            .await
            .map_err(|e| EnrichmentUnavailable(format!("decode: {}", e)))?;

        tracing::debug!(game_id = %unit.game_id, events = feed.events.len(), "Retrieved lineup feed");
        Ok(feed.events)
    }
}
