//! Run summary types
//!
//! This module defines the data structures for run summaries and the
//! associated error type.

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("No runs found in database")]
    NoRuns,

    #[error("No dataset named '{0}' is configured")]
    UnknownDataset(String),

    #[error("No datasets are configured")]
    NoDatasets,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A year the run gave up on
#[derive(Debug, Clone, PartialEq)]
pub struct AbandonedYear {
    pub year: u16,
    pub attempts: u32,
    pub error: Option<String>,
}

/// Summary of one journaled run
#[derive(Debug, Clone, Default)]
pub struct RunDigest {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Year counts
    pub years_total: u64,
    pub years_succeeded: u64,
    pub years_abandoned: u64,
    pub total_attempts: u64,
    pub tables_written: u64,

    pub abandoned: Vec<AbandonedYear>,
}

impl RunDigest {
    /// Share of years that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.years_total == 0 {
            0.0
        } else {
            self.years_succeeded as f64 / self.years_total as f64 * 100.0
        }
    }

    /// Attempts beyond the first, over all years
    pub fn retries(&self) -> u64 {
        self.total_attempts.saturating_sub(self.years_total)
    }
}
