//! Utility modules for hoopdata-fetch

pub mod fetch_retry;

pub use fetch_retry::RetryPolicy;
