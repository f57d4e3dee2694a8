//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::clean::Frame;
use crate::harvest::YearOutcome;
use crate::state::YearState;
use crate::storage::{ImportReport, OutcomeRecord, QueryOutput, RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Table '{0}' is reserved for the run journal")]
    ReservedTable(String),

    #[error("Dataset has no column '{0}'")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Covers the run journal, dataset imports and ad-hoc queries.
pub trait Store {
    // ===== Run Journal =====

    /// Creates a new scrape run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and a finish timestamp
    fn complete_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Records the final state of each processed year
    fn record_outcomes(&mut self, run_id: i64, outcomes: &[YearOutcome]) -> StorageResult<()>;

    /// Gets the recorded years of a run, in year order
    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<OutcomeRecord>>;

    /// Counts a run's years by final state
    fn count_outcomes_by_state(&self, run_id: i64) -> StorageResult<HashMap<YearState, u64>>;

    // ===== Datasets =====

    /// Replaces a dataset table wholesale
    ///
    /// Rows missing any of `required` are dropped. The old table is removed
    /// and the new one created and filled in a single transaction.
    ///
    /// # Arguments
    ///
    /// * `table` - Destination table name
    /// * `frame` - Cleaned dataset with a header
    /// * `required` - Columns that must be non-empty for a row to load
    fn replace_table(
        &mut self,
        table: &str,
        frame: &Frame,
        required: &[&str],
    ) -> StorageResult<ImportReport>;

    /// Lists user tables, sorted by name
    fn table_names(&self) -> StorageResult<Vec<String>>;

    // ===== Queries =====

    /// Runs one SQL statement and returns its rows rendered as text
    fn query(&mut self, sql: &str) -> StorageResult<QueryOutput>;
}
