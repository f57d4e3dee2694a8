//! Year processor
//!
//! Loads one season page, waits for its tables, then extracts, repairs and
//! appends each table. Markup is parsed in plain functions after the last
//! await, so no parsed document ever lives across a suspension point.

use crate::browser::Session;
use crate::failure::log_failure;
use crate::harvest::destination::TableSink;
use crate::harvest::extract::{extract_table, normalize_whitespace};
use crate::harvest::record::{clean_title, TableRecord, UNKNOWN_TABLE};
use crate::harvest::repair::repair_table;
use crate::navigator::YearLink;
use crate::{Result, ScrapeError};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// Selector the processor waits for before reading a season page
pub const TABLE_SELECTOR: &str = "table";

/// Processes one season with a borrowed session
///
/// The controller drives implementations of this trait; errors are
/// classified by the controller, not here.
#[async_trait]
pub trait YearTask: Send {
    async fn process_year(&mut self, session: &mut dyn Session, link: &YearLink)
        -> Result<YearReport>;
}

/// What one successful pass over a season produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearReport {
    pub year: u16,
    pub tables_found: usize,
    pub tables_written: usize,
    pub tables_skipped: usize,
    pub rows_written: usize,
    pub destinations: Vec<String>,
}

/// Extracts season tables into a [`TableSink`]
pub struct YearProcessor<S: TableSink> {
    sink: S,
    table_wait: Duration,
}

impl<S: TableSink> YearProcessor<S> {
    pub fn new(sink: S, table_wait: Duration) -> Self {
        Self { sink, table_wait }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Repairs and stores tables already pulled from a page
    fn store_tables(
        &mut self,
        year: u16,
        tables: Vec<std::result::Result<TableRecord, ScrapeError>>,
    ) -> Result<YearReport> {
        let mut report = YearReport {
            year,
            tables_found: tables.len(),
            ..Default::default()
        };

        for table in tables {
            let mut record = match table {
                Ok(record) => record,
                Err(e) => {
                    log_failure(&format!("Skipping table for {}", year), &e);
                    report.tables_skipped += 1;
                    continue;
                }
            };

            if record.is_empty() {
                tracing::debug!("Table '{}' for {} has no rows", record.title, year);
                report.tables_skipped += 1;
                continue;
            }

            if let Err(e) = repair_table(&mut record) {
                let err = ScrapeError::Parse {
                    title: record.title.clone(),
                    message: e.to_string(),
                };
                log_failure(&format!("Skipping table for {}", year), &err);
                report.tables_skipped += 1;
                continue;
            }

            let destination = self.sink.append(&record.title, &record.rows)?;
            report.tables_written += 1;
            report.rows_written += record.rows.len();
            if !report.destinations.contains(&destination) {
                report.destinations.push(destination);
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl<S: TableSink> YearTask for YearProcessor<S> {
    async fn process_year(
        &mut self,
        session: &mut dyn Session,
        link: &YearLink,
    ) -> Result<YearReport> {
        session.goto(&link.url).await?;
        session
            .wait_for_selector(TABLE_SELECTOR, self.table_wait)
            .await?;

        let tables = read_tables(session.page_source()?, link.year)?;
        let report = self.store_tables(link.year, tables)?;

        tracing::info!(
            "Year {}: {} tables found, {} written, {} skipped",
            report.year,
            report.tables_found,
            report.tables_written,
            report.tables_skipped
        );
        Ok(report)
    }
}

/// Pulls every table out of a season page
///
/// Each entry is either an extracted table with its cleaned title or the
/// parse failure for that table.
pub fn read_tables(
    html: &str,
    year: u16,
) -> Result<Vec<std::result::Result<TableRecord, ScrapeError>>> {
    let table_selector = parse_selector(TABLE_SELECTOR)?;
    let document = Html::parse_document(html);

    let tables = document
        .select(&table_selector)
        .map(|table| {
            let title = table_title(table, year)?;
            extract_table(table)
                .map(|extracted| TableRecord::new(title.clone(), year, extracted))
                .map_err(|e| ScrapeError::Parse {
                    title,
                    message: e.to_string(),
                })
        })
        .collect();

    Ok(tables)
}

/// Finds a table's title and strips the season prefix
///
/// The first `h2` inside the table wins, then the first `td.header` or
/// `td.banner` cell. Blank candidates count as absent. Tables with neither
/// are titled [`UNKNOWN_TABLE`].
pub fn table_title(table: ElementRef<'_>, year: u16) -> Result<String> {
    for css in ["h2", "td.header, td.banner"] {
        let selector = parse_selector(css)?;
        if let Some(element) = table.select(&selector).next() {
            let text = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                return Ok(clean_title(&text, year));
            }
        }
    }
    Ok(UNKNOWN_TABLE.to_string())
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::Structure(format!("invalid selector '{}': {:?}", css, e)))
}
