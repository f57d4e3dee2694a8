//! Statistics from the run journal
//!
//! This module provides functionality for extracting and displaying
//! per-run statistics from the storage layer.

use crate::state::YearState;
use crate::storage::{OutcomeRecord, RunRecord, Store};
use crate::ScrapeError;
use std::collections::HashMap;

/// Run statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// The run the statistics belong to
    pub run: RunRecord,

    /// Count of years by final state
    pub years_by_state: HashMap<YearState, u64>,

    /// Every journaled year, in year order
    pub outcomes: Vec<OutcomeRecord>,
}

impl RunStatistics {
    pub fn total_years(&self) -> u64 {
        self.outcomes.len() as u64
    }

    pub fn total_attempts(&self) -> u64 {
        self.outcomes.iter().map(|o| o.attempts as u64).sum()
    }

    pub fn tables_written(&self) -> u64 {
        self.outcomes.iter().map(|o| o.tables_written as u64).sum()
    }

    pub fn count(&self, state: YearState) -> u64 {
        self.years_by_state.get(&state).copied().unwrap_or(0)
    }
}

/// Loads statistics for the latest run
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(Some(RunStatistics))` - Statistics of the most recent run
/// * `Ok(None)` - The journal is empty
/// * `Err(ScrapeError)` - Failed to query statistics
pub fn load_statistics(store: &dyn Store) -> Result<Option<RunStatistics>, ScrapeError> {
    let Some(run) = store.get_latest_run()? else {
        return Ok(None);
    };

    let years_by_state = store.count_outcomes_by_state(run.id)?;
    let outcomes = store.get_outcomes(run.id)?;

    Ok(Some(RunStatistics {
        run,
        years_by_state,
        outcomes,
    }))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Run {}:", stats.run.id);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Years processed: {}", stats.total_years());
    println!("  Attempts made: {}", stats.total_attempts());
    println!("  Tables written: {}", stats.tables_written());
    println!();

    println!("Years by State:");
    let mut state_counts: Vec<_> = stats.years_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        println!("  {}: {}", state, count);
    }
    println!();

    let abandoned: Vec<_> = stats
        .outcomes
        .iter()
        .filter(|o| o.state == YearState::Abandoned)
        .collect();
    if !abandoned.is_empty() {
        println!("Abandoned Years ({}):", abandoned.len());
        for outcome in abandoned {
            println!(
                "  - {} after {} attempt(s): {}",
                outcome.year,
                outcome.attempts,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!();
    }

    let succeeded = stats.count(YearState::Succeeded);
    let success_rate = if stats.total_years() > 0 {
        (succeeded as f64 / stats.total_years() as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} years scraped)",
        success_rate,
        succeeded,
        stats.total_years()
    );
}
