//! Output module for run summaries and dataset reports
//!
//! This module handles:
//! - Printing statistics of the latest run from the journal
//! - Generating markdown summaries of a run
//! - Dashboard views over cleaned datasets

mod markdown;
pub mod report;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use report::{
    build_report, load_dataset, render_report, select_dataset, DatasetReport, ReportFilter,
    NO_MATCH_WARNING,
};
pub use stats::{load_statistics, print_statistics, RunStatistics};
pub use summary::{AbandonedYear, OutputError, OutputResult, RunDigest};

use crate::state::YearState;
use crate::storage::Store;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Generates a run summary from storage
///
/// # Arguments
///
/// * `store` - The storage backend containing the run journal
///
/// # Returns
///
/// * `Ok(RunDigest)` - Summary of the latest run
/// * `Err(ScrapeError)` - No run is journaled, or the query failed
pub fn generate_summary(store: &dyn Store) -> Result<RunDigest, ScrapeError> {
    let stats = load_statistics(store)?.ok_or(OutputError::NoRuns)?;
    let run = &stats.run;

    let duration_seconds = match (run.started_at.parse::<DateTime<Utc>>(), &run.finished_at) {
        (Ok(started), Some(finished)) => finished
            .parse::<DateTime<Utc>>()
            .ok()
            .map(|finished| (finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    let abandoned = stats
        .outcomes
        .iter()
        .filter(|o| o.state == YearState::Abandoned)
        .map(|o| AbandonedYear {
            year: o.year,
            attempts: o.attempts,
            error: o.error.clone(),
        })
        .collect();

    Ok(RunDigest {
        run_id: run.id,
        started_at: run.started_at.clone(),
        finished_at: run.finished_at.clone(),
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash.clone(),
        years_total: stats.total_years(),
        years_succeeded: stats.count(YearState::Succeeded),
        years_abandoned: stats.count(YearState::Abandoned),
        total_attempts: stats.total_attempts(),
        tables_written: stats.tables_written(),
        abandoned,
    })
}

/// Markdown summary path for a database: `<dir>/<stem>_summary.md`
pub fn summary_path(database_path: &Path) -> PathBuf {
    let stem = database_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scrape");
    database_path.with_file_name(format!("{}_summary.md", stem))
}
