//! Loads cleaned datasets into the store

use crate::clean::{cleaned_path, Frame, STATISTIC_NAME, STATISTIC_VALUE, YEAR};
use crate::config::{Config, DatasetEntry};
use crate::storage::traits::Store;
use crate::storage::ImportReport;
use crate::Result;
use std::path::Path;

/// A dataset row missing any of these is not loaded
pub const REQUIRED_COLUMNS: &[&str] = &[YEAR, STATISTIC_NAME, STATISTIC_VALUE];

/// Replaces one dataset's table with the contents of its cleaned file
pub fn import_dataset<S: Store>(
    store: &mut S,
    cleaned_dir: &Path,
    dataset: &DatasetEntry,
) -> Result<ImportReport> {
    let path = cleaned_path(cleaned_dir, dataset);
    tracing::info!("Processing {} into table: {}", path.display(), dataset.table);

    let frame = Frame::read_csv(&path)?;
    tracing::info!(
        "Loaded {} rows with columns: {:?}",
        frame.len(),
        frame.headers
    );

    let report = store.replace_table(&dataset.table, &frame, REQUIRED_COLUMNS)?;
    tracing::info!(
        "Imported {} rows into '{}' ({} dropped for missing fields)",
        report.rows_loaded,
        report.table,
        report.rows_dropped
    );
    Ok(report)
}

/// Imports every configured dataset
///
/// Stops at the first failure; tables already replaced stay replaced.
pub fn import_all<S: Store>(store: &mut S, config: &Config) -> Result<Vec<ImportReport>> {
    let cleaned_dir = Path::new(&config.output.cleaned_dir);
    config
        .datasets
        .iter()
        .map(|dataset| import_dataset(store, cleaned_dir, dataset))
        .collect()
}
