//! Ordered cleaning steps for the review datasets
//!
//! Raw review files carry the site's layout along with the data: a junk
//! column, title rows, a header row per season. The steps below peel that
//! away in a fixed order; later steps rely on the column names earlier steps
//! establish.

use crate::clean::frame::Frame;
use crate::clean::CleanError;
use regex::Regex;
use std::sync::OnceLock;

pub const YEAR: &str = "Year";
pub const STATISTIC: &str = "Statistic";
pub const STATISTIC_NAME: &str = "Statistic Name";
pub const STATISTIC_VALUE: &str = "Statistic Value";
pub const VALUE_MARK: &str = "#";

/// Season whose data is not published yet
pub const UNPUBLISHED_YEAR: i64 = 2025;

static YEAR_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn year_pattern() -> Result<&'static Regex, CleanError> {
    YEAR_PATTERN
        .get_or_init(|| Regex::new(r"\b(?:18|19|20)\d{2}\b").ok())
        .as_ref()
        .ok_or_else(|| CleanError::Pattern(r"\b(?:18|19|20)\d{2}\b".to_string()))
}

/// One cleaning step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStep {
    DropTrailingColumn,
    DropYearLikeRows,
    PromoteHeader,
    RenameYearColumn,
    TrimWhitespace,
    CoerceYear,
    DropYear(i64),
    DropEmbeddedHeaders,
    RenameStatisticColumns,
    CoerceStatisticValue,
    StripAsterisks,
    DropDuplicates,
    ReportMissing,
}

/// The cleaning pipeline, in application order
pub const CLEANING_STEPS: &[CleanStep] = &[
    CleanStep::DropTrailingColumn,
    CleanStep::DropYearLikeRows,
    CleanStep::PromoteHeader,
    CleanStep::RenameYearColumn,
    CleanStep::TrimWhitespace,
    CleanStep::CoerceYear,
    CleanStep::DropYear(UNPUBLISHED_YEAR),
    CleanStep::DropEmbeddedHeaders,
    CleanStep::RenameStatisticColumns,
    CleanStep::CoerceStatisticValue,
    CleanStep::StripAsterisks,
    CleanStep::DropDuplicates,
    CleanStep::ReportMissing,
];

impl CleanStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DropTrailingColumn => "drop trailing column",
            Self::DropYearLikeRows => "drop year-like rows",
            Self::PromoteHeader => "promote header",
            Self::RenameYearColumn => "rename year column",
            Self::TrimWhitespace => "trim whitespace",
            Self::CoerceYear => "coerce year",
            Self::DropYear(_) => "drop unpublished year",
            Self::DropEmbeddedHeaders => "drop embedded headers",
            Self::RenameStatisticColumns => "rename statistic columns",
            Self::CoerceStatisticValue => "coerce statistic value",
            Self::StripAsterisks => "strip asterisks",
            Self::DropDuplicates => "drop duplicates",
            Self::ReportMissing => "report missing values",
        }
    }

    /// Applies the step and returns the number of rows it dropped
    pub fn apply(&self, frame: &mut Frame) -> Result<usize, CleanError> {
        match self {
            Self::DropTrailingColumn => {
                frame.drop_last_column();
                Ok(0)
            }
            Self::DropYearLikeRows => {
                let pattern = year_pattern()?;
                Ok(frame.retain_rows(|row| row.get(1).map_or(true, |c| !pattern.is_match(c))))
            }
            Self::PromoteHeader => {
                frame.promote_first_row()?;
                Ok(0)
            }
            Self::RenameYearColumn => {
                let first = frame
                    .headers
                    .first_mut()
                    .ok_or_else(|| CleanError::MissingColumn(YEAR.to_string()))?;
                *first = YEAR.to_string();
                Ok(0)
            }
            Self::TrimWhitespace => {
                for header in &mut frame.headers {
                    *header = header.trim().to_string();
                }
                for row in &mut frame.rows {
                    for cell in row.iter_mut() {
                        *cell = cell.trim().to_string();
                    }
                }
                Ok(0)
            }
            Self::CoerceYear => {
                let index = frame.require_column(YEAR)?;
                frame.map_column(index, |value| {
                    coerce_integer(value).map(|y| y.to_string()).unwrap_or_default()
                });
                Ok(0)
            }
            Self::DropYear(year) => {
                let index = frame.require_column(YEAR)?;
                let year = year.to_string();
                Ok(frame.retain_rows(|row| row[index] != year))
            }
            Self::DropEmbeddedHeaders => {
                let index = frame.require_column(STATISTIC)?;
                Ok(frame.retain_rows(|row| row[index] != STATISTIC))
            }
            Self::RenameStatisticColumns => {
                frame.rename_column(STATISTIC, STATISTIC_NAME);
                frame.rename_column(VALUE_MARK, STATISTIC_VALUE);
                Ok(0)
            }
            Self::CoerceStatisticValue => {
                let index = frame.require_column(STATISTIC_VALUE)?;
                frame.map_column(index, |value| {
                    coerce_number(value).unwrap_or_default()
                });
                let dropped = frame.retain_rows(|row| !row[index].is_empty());
                if dropped > 0 {
                    tracing::warn!("Dropped {} rows with non-numeric statistic values", dropped);
                }
                Ok(dropped)
            }
            Self::StripAsterisks => {
                let index = frame.require_column(STATISTIC_NAME)?;
                frame.map_column(index, |value| value.replace('*', "").trim().to_string());
                Ok(0)
            }
            Self::DropDuplicates => Ok(frame.dedup_rows()),
            Self::ReportMissing => {
                let missing: Vec<String> = frame
                    .missing_counts()
                    .into_iter()
                    .filter(|(_, count)| *count > 0)
                    .map(|(name, count)| format!("{}={}", name, count))
                    .collect();
                if missing.is_empty() {
                    tracing::info!("No missing values");
                } else {
                    tracing::info!("Missing values: {}", missing.join(", "));
                }
                Ok(0)
            }
        }
    }
}

/// Parses an integer, accepting whole floats such as `1991.0`
pub fn coerce_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

/// Parses a number and renders it canonically; `None` if not numeric
pub fn coerce_number(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n.to_string());
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.to_string()),
        _ => None,
    }
}
