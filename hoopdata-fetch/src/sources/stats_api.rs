//! Stats API client
//!
//! Serves two collaborators from one upstream: the game listing
//! (`leaguegamefinder`) and the shot chart (`shotchartdetail`). Both endpoints
//! answer with tabular `resultSets` (a header row plus row arrays), which are
//! decoded into field maps without interpreting the domain fields.

use super::{GameSource, PrimarySource};
use crate::error::FetchError;
use crate::types::{Partition, RawEventRecord, WorkUnit};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:91.0) Gecko/20100101 Firefox/91.0";

/// Result set holding one row per shot attempt
pub const SHOT_CHART_RESULT_SET: &str = "Shot_Chart_Detail";
/// Shot field carrying the per-game event number
pub const EVENT_ID_FIELD: &str = "GAME_EVENT_ID";

/// Tabular response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ResultSetsResponse {
    #[serde(rename = "resultSets")]
    pub result_sets: Vec<ResultSet>,
}

/// One named table: headers plus positional rows
#[derive(Debug, Clone, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet", default)]
    pub row_set: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Zip each row with the headers; short rows get nulls
    pub fn into_rows(self) -> Vec<Map<String, Value>> {
        let headers = self.headers;
        self.row_set
            .into_iter()
            .map(|row| {
                let mut values = row.into_iter();
                headers
                    .iter()
                    .map(|h| (h.clone(), values.next().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect()
    }
}

impl ResultSetsResponse {
    /// Table named `name`, or the first table if none carries that name
    pub fn take(self, name: &str) -> Result<ResultSet, FetchError> {
        let mut sets = self.result_sets;
        let index = sets.iter().position(|s| s.name == name).unwrap_or(0);
        if sets.is_empty() {
            return Err(FetchError::Parse("response contained no result sets".to_string()));
        }
        Ok(sets.swap_remove(index))
    }
}

/// Work units for `partition` from a game listing, keeping only its season
pub fn decode_games(response: ResultSetsResponse, partition: &Partition) -> Result<Vec<WorkUnit>, FetchError> {
    let rows = response.take("LeagueGameFinderResults")?.into_rows();

    let mut units = Vec::new();
    for row in rows {
        let season_id = row.get("SEASON_ID").map(value_as_string);
        if season_id.as_deref() != Some(partition.season_id.as_str()) {
            continue;
        }

        let Some(game_id) = row.get("GAME_ID").map(value_as_string).filter(|g| !g.is_empty()) else {
            return Err(FetchError::Parse("game row without GAME_ID".to_string()));
        };

        let mut unit = WorkUnit::new(partition.key.clone(), game_id, partition.team_id);
        unit.game_date = row.get("GAME_DATE").and_then(non_null_string);
        unit.matchup = row.get("MATCHUP").and_then(non_null_string);
        units.push(unit);
    }

    Ok(units)
}

/// Opaque shot records from a shot chart response
pub fn decode_shots(response: ResultSetsResponse) -> Result<Vec<RawEventRecord>, FetchError> {
    Ok(response
        .take(SHOT_CHART_RESULT_SET)?
        .into_rows()
        .into_iter()
        .map(|fields| RawEventRecord::from_fields(fields, EVENT_ID_FIELD))
        .collect())
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_null_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(value_as_string(other)),
    }
}

/// Stats API client
pub struct StatsApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl StatsApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
        headers.insert("x-nba-stats-origin", HeaderValue::from_static("stats"));
        headers.insert("x-nba-stats-token", HeaderValue::from_static("true"));

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_result_sets(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<ResultSetsResponse, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(url = %url, "Querying stats API");

        let response = self.http_client.get(&url).query(params).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl GameSource for StatsApiClient {
    async fn list_work_units(&self, partition: &Partition) -> Result<Vec<WorkUnit>, FetchError> {
        let params = [
            ("PlayerOrTeam", "T".to_string()),
            ("TeamID", partition.team_id.to_string()),
            ("LeagueID", "00".to_string()),
        ];
        let response = self.get_result_sets("leaguegamefinder", &params).await?;
        decode_games(response, partition)
    }
}

#[async_trait::async_trait]
impl PrimarySource for StatsApiClient {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<RawEventRecord>, FetchError> {
        let params = [
            ("TeamID", unit.team_id.to_string()),
            ("PlayerID", "0".to_string()),
            ("GameID", unit.game_id.clone()),
            ("ContextMeasure", "FGA".to_string()),
            ("LeagueID", "00".to_string()),
            ("Season", unit.partition.season.clone()),
            ("SeasonType", "Regular Season".to_string()),
            ("LastNGames", "0".to_string()),
            ("Month", "0".to_string()),
            ("OpponentTeamID", "0".to_string()),
            ("Period", "0".to_string()),
        ];
        let response = self.get_result_sets("shotchartdetail", &params).await?;
        let shots = decode_shots(response)?;

        tracing::debug!(game_id = %unit.game_id, shots = shots.len(), "Retrieved shot chart");
        Ok(shots)
    }
}
