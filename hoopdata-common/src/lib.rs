//! # hoopdata common library
//!
//! Shared code for the hoopdata collection tools:
//! - Error type
//! - Run configuration loading and data directory resolution
//! - Atomic JSON persistence

pub mod config;
pub mod error;
pub mod storage;

pub use config::{FetchConfig, FlushPolicy};
pub use error::{Error, Result};
