//! Dataset cleaning
//!
//! Reads a raw review file from the scrape output, runs the ordered
//! [`CLEANING_STEPS`] over it and writes the result with a header row to the
//! cleaned directory as `<name>_cleaned.csv`.

mod frame;
mod rules;

pub use frame::Frame;
pub use rules::{
    coerce_integer, coerce_number, CleanStep, CLEANING_STEPS, STATISTIC_NAME, STATISTIC_VALUE,
    UNPUBLISHED_YEAR, YEAR,
};

use crate::config::{Config, DatasetEntry};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Dataset is empty")]
    Empty,

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Outcome of cleaning one dataset
#[derive(Debug, Clone)]
pub struct CleanReport {
    pub dataset: String,
    pub output: PathBuf,
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped_by_step: Vec<(&'static str, usize)>,
}

/// Runs every cleaning step over headerless raw rows
pub fn clean_rows(raw: Vec<Vec<String>>) -> Result<(Frame, Vec<(&'static str, usize)>), CleanError> {
    if raw.is_empty() {
        return Err(CleanError::Empty);
    }

    let mut frame = Frame::from_raw(raw);
    let mut dropped = Vec::new();
    for step in CLEANING_STEPS {
        let count = step.apply(&mut frame)?;
        tracing::debug!("{}: {} rows dropped, {} left", step.name(), count, frame.len());
        if count > 0 {
            dropped.push((step.name(), count));
        }
    }
    Ok((frame, dropped))
}

/// Path of the raw file for a dataset
pub fn raw_path(scraped_dir: &Path, dataset: &DatasetEntry) -> PathBuf {
    scraped_dir.join(format!("{}.csv", dataset.name))
}

/// Path of the cleaned file for a dataset
pub fn cleaned_path(cleaned_dir: &Path, dataset: &DatasetEntry) -> PathBuf {
    cleaned_dir.join(format!("{}_cleaned.csv", dataset.name))
}

/// Reads a headerless raw file; rows may differ in width
pub fn read_raw(path: &Path) -> Result<Vec<Vec<String>>, CleanError> {
    let file = File::open(path).map_err(|source| CleanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(String::from).collect())
                .map_err(|source| CleanError::Csv {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .collect()
}

/// Cleans one dataset from `scraped_dir` into `cleaned_dir`
pub fn clean_dataset(
    scraped_dir: &Path,
    cleaned_dir: &Path,
    dataset: &DatasetEntry,
) -> Result<CleanReport, CleanError> {
    let input = raw_path(scraped_dir, dataset);
    let raw = read_raw(&input)?;
    let rows_in = raw.len();

    let (frame, dropped_by_step) = clean_rows(raw)?;

    fs::create_dir_all(cleaned_dir).map_err(|source| CleanError::Io {
        path: cleaned_dir.to_path_buf(),
        source,
    })?;
    let output = cleaned_path(cleaned_dir, dataset);
    frame.write_csv(&output)?;

    tracing::info!(
        "Cleaned {}: {} raw rows -> {} rows ({})",
        dataset.name,
        rows_in,
        frame.len(),
        output.display()
    );

    Ok(CleanReport {
        dataset: dataset.name.clone(),
        output,
        rows_in,
        rows_out: frame.len(),
        dropped_by_step,
    })
}

/// Cleans every configured dataset
///
/// A dataset that fails is logged and skipped; the others still run.
pub fn clean_all(config: &Config) -> Vec<Result<CleanReport, CleanError>> {
    let scraped = Path::new(&config.output.scraped_dir);
    let cleaned = Path::new(&config.output.cleaned_dir);

    config
        .datasets
        .iter()
        .map(|dataset| {
            let result = clean_dataset(scraped, cleaned, dataset);
            if let Err(e) = &result {
                tracing::error!("Failed to clean {}: {}", dataset.name, e);
            }
            result
        })
        .collect()
}
