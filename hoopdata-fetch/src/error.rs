//! Error types for hoopdata-fetch
//!
//! Source-level failures never reach the orchestrator's caller: primary
//! failures are retried then degraded to "no data", enrichment failures
//! degrade to an empty lineup snapshot. Only persistence failures abort a run.

use thiserror::Error;

/// Transient primary-source failure (retried with backoff)
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// The enrichment source cannot serve this unit (expected, never retried)
#[derive(Debug, Clone, Error)]
#[error("Enrichment unavailable: {0}")]
pub struct EnrichmentUnavailable(pub String);

/// Errors that terminate a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Checkpoint or dataset could not be read or written
    #[error(transparent)]
    Persistence(#[from] hoopdata_common::Error),

    /// Collaborators could not be constructed
    #[error("Setup error: {0}")]
    Setup(String),
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        PipelineError::Setup(err.to_string())
    }
}

impl From<EnrichmentUnavailable> for PipelineError {
    fn from(err: EnrichmentUnavailable) -> Self {
        PipelineError::Setup(err.to_string())
    }
}

/// Result type for pipeline runs
pub type PipelineResult<T> = Result<T, PipelineError>;
