//! Season table harvesting
//!
//! # Components
//!
//! - `record`: table records and title normalisation
//! - `extract`: HTML table to rectangular grid
//! - `repair`: era column insertions
//! - `destination`: append-only raw table files
//! - `processor`: one season page per call
//! - `controller`: the year loop with retry and restart policy

mod controller;
mod destination;
mod extract;
mod processor;
mod record;
mod repair;

pub use controller::{Controller, RetryPolicy, RunSummary, YearOutcome};
pub use destination::{CsvDestinations, TableSink};
pub use extract::{extract_markup, extract_table, normalize_whitespace, ExtractError, ExtractedTable};
pub use processor::{read_tables, table_title, YearProcessor, YearReport, YearTask, TABLE_SELECTOR};
pub use record::{clean_title, sanitize_title, TableRecord, MAX_DESTINATION_NAME, UNKNOWN_TABLE};
pub use repair::{
    repair_table, EraRule, Filler, Position, RepairError, TitleSet, AMERICAN_LEAGUE_TITLES,
    ERA_RULES, YEAR_RULE,
};

use crate::browser::launcher_from_config;
use crate::navigator::{ordered_links, year_link_selector, Navigator, YearLink};
use crate::storage::{RunStatus, SqliteStore, Store};
use crate::{Config, Result, ScrapeError};
use std::path::Path;
use std::time::Duration;

/// Discovers the year links for a configuration
///
/// Launches a session, reads the index page and applies the configured year
/// range. No matching links at all is a structure error.
async fn discover(navigator: &mut Navigator, config: &Config) -> Result<Vec<YearLink>> {
    navigator.initialize()?;

    let links = navigator.fetch_year_links().await;
    if links.is_empty() {
        return Err(ScrapeError::Structure(format!(
            "No links matching `{}` found on {}. Double check site structure or selectors.",
            year_link_selector(&config.scraper.league_label),
            config.scraper.index_url()
        )));
    }
    tracing::info!("Found {} years", links.len());

    let years: Vec<YearLink> = ordered_links(&links)
        .into_iter()
        .filter(|link| config.scraper.includes_year(link.year))
        .collect();
    if years.len() < links.len() {
        tracing::info!(
            "{} of {} years fall inside the configured range",
            years.len(),
            links.len()
        );
    }

    Ok(years)
}

/// Runs a full scrape: discovery, then every year in order
///
/// # Arguments
///
/// * `config` - Loaded configuration
///
/// # Returns
///
/// The per-year outcomes, or the fatal error that stopped the run
pub async fn run_scrape(config: &Config) -> Result<RunSummary> {
    let launcher = launcher_from_config(&config.browser);
    let mut navigator = Navigator::new(launcher, &config.scraper, config.browser.headless);

    let years = match discover(&mut navigator, config).await {
        Ok(years) => years,
        Err(e) => {
            navigator.shutdown();
            return Err(e);
        }
    };

    let sink = CsvDestinations::new(&config.output.scraped_dir);
    let processor = YearProcessor::new(
        sink,
        Duration::from_millis(config.scraper.table_wait_timeout),
    );
    let mut controller = Controller::new(
        navigator,
        processor,
        RetryPolicy::from_config(&config.scraper),
    );

    let summary = controller.run(&years).await?;
    tracing::info!(
        "Scrape finished: {} succeeded, {} abandoned, {} tables written, {} restarts",
        summary.succeeded(),
        summary.abandoned(),
        summary.tables_written(),
        summary.restarts
    );
    Ok(summary)
}

/// Runs a scrape and records it in the run journal
///
/// The run row is opened before discovery and closed with its final status,
/// so failed runs are journaled too.
pub async fn scrape_and_record(config: &Config, config_hash: &str) -> Result<RunSummary> {
    let db_path = Path::new(&config.output.database_path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut store = SqliteStore::new(db_path)?;
    let run_id = store.create_run(config_hash)?;

    match run_scrape(config).await {
        Ok(summary) => {
            store.record_outcomes(run_id, &summary.outcomes)?;
            store.complete_run(run_id, RunStatus::Completed)?;
            Ok(summary)
        }
        Err(e) => {
            store.complete_run(run_id, RunStatus::Failed)?;
            Err(e)
        }
    }
}
