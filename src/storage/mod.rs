//! Storage module for persisting scrape data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The run journal (runs and per-year outcomes)
//! - Wholesale dataset imports from the cleaned files
//! - Ad-hoc statements for the query shell

mod import;
mod schema;
mod sqlite;
mod traits;

pub use import::{import_all, import_dataset, REQUIRED_COLUMNS};
pub use schema::JOURNAL_TABLES;
pub use sqlite::{quote_identifier, SqliteStore};
pub use traits::{StorageError, StorageResult, Store};

use crate::state::YearState;
use crate::ScrapeError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(ScrapeError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStore, ScrapeError> {
    SqliteStore::new(path)
}

/// Represents a scrape run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One journaled year
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub run_id: i64,
    pub year: u16,
    pub url: String,
    pub state: YearState,
    pub attempts: u32,
    pub tables_written: u32,
    pub error: Option<String>,
}

/// Column affinity inferred from a dataset's values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Narrowest type that holds every non-empty value
    ///
    /// A column with no values at all is `Text`.
    pub fn infer<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let mut inferred = Self::Integer;
        let mut seen = false;
        for value in values.filter(|v| !v.is_empty()) {
            seen = true;
            if inferred == Self::Integer && value.parse::<i64>().is_err() {
                inferred = Self::Real;
            }
            if inferred == Self::Real && value.parse::<f64>().is_err() {
                return Self::Text;
            }
        }
        if seen {
            inferred
        } else {
            Self::Text
        }
    }
}

/// Result of one dataset import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub table: String,
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub columns: Vec<(String, ColumnType)>,
}

/// Rows returned by an ad-hoc statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub changes: u64,
}
