//! Almanac-Scraper main entry point
//!
//! This is the command-line interface for the American League history scraper.

use almanac_scraper::config::{load_config_with_hash, Config};
use almanac_scraper::harvest::scrape_and_record;
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Almanac-Scraper: American League history harvester
///
/// Almanac-Scraper walks the baseball-almanac.com year menu, collects every
/// American League season table into per-title CSV files, and can clean,
/// import, query and report on the results.
#[derive(Parser, Debug)]
#[command(name = "almanac-scraper")]
#[command(version = "1.0.0")]
#[command(about = "American League history scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, group = "mode")]
    dry_run: bool,

    /// Show statistics of the latest run and exit
    #[arg(long, group = "mode")]
    stats: bool,

    /// Generate markdown summary of the latest run and exit
    #[arg(long, group = "mode")]
    export_summary: bool,

    /// Clean the scraped datasets
    #[arg(long, group = "mode")]
    clean: bool,

    /// Import the cleaned datasets into the database
    #[arg(long, group = "mode")]
    import: bool,

    /// Open an interactive SQL shell on the database
    #[arg(long, group = "mode")]
    shell: bool,

    /// Print dashboard views of a cleaned dataset
    #[arg(long, group = "mode")]
    report: bool,

    /// Dataset to report on, by name, table or label (default: first)
    #[arg(long, requires = "report")]
    dataset: Option<String>,

    /// Restrict the report to these years (repeatable)
    #[arg(long = "year", value_name = "YEAR", requires = "report")]
    years: Vec<i64>,

    /// Statistics to report on (repeatable, default: Strikeouts)
    #[arg(long = "stat", value_name = "NAME", requires = "report")]
    stats_filter: Vec<String>,

    /// Restrict the report to these players (repeatable)
    #[arg(long = "player", value_name = "NAME", requires = "report")]
    players: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if cli.clean {
        handle_clean(&config)?;
    } else if cli.import {
        handle_import(&config)?;
    } else if cli.shell {
        handle_shell(&config)?;
    } else if cli.report {
        handle_report(&config, &cli)?;
    } else {
        handle_scrape(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("almanac_scraper=info,warn"),
            1 => EnvFilter::new("almanac_scraper=debug,info"),
            2 => EnvFilter::new("almanac_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Almanac-Scraper Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Index page: {}", config.scraper.index_url());
    println!("  League label: {}", config.scraper.league_label);
    println!("  Max attempts per year: {}", config.scraper.max_attempts);
    println!("  Restart every: {} years", config.scraper.restart_every);
    println!("  Year cooldown: {}ms", config.scraper.year_cooldown);
    println!("  Table wait timeout: {}ms", config.scraper.table_wait_timeout);
    match (config.scraper.first_year, config.scraper.last_year) {
        (None, None) => println!("  Years: all"),
        (first, last) => println!(
            "  Years: {} to {}",
            first.map_or("first".to_string(), |y| y.to_string()),
            last.map_or("last".to_string(), |y| y.to_string())
        ),
    }

    println!("\nBrowser:");
    println!("  Backend: {:?}", config.browser.backend);
    println!("  Headless: {}", config.browser.headless);
    println!("  User agent: {}", config.browser.user_agent);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    println!("  Page load timeout: {}ms", config.browser.page_load_timeout);
    if let Some(url) = &config.browser.browserless_url {
        println!("  Browserless URL: {}", url);
    }

    println!("\nOutput:");
    println!("  Scraped data: {}", config.output.scraped_dir);
    println!("  Cleaned data: {}", config.output.cleaned_dir);
    println!("  Database: {}", config.output.database_path);

    println!("\nDatasets ({}):", config.datasets.len());
    for dataset in &config.datasets {
        println!(
            "  - {} -> table '{}' ({})",
            dataset.name,
            dataset.table,
            dataset.display_name()
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the latest run
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use almanac_scraper::output::{load_statistics, print_statistics};
    use almanac_scraper::storage::open_storage;

    println!("Database: {}\n", config.output.database_path);

    let store = open_storage(Path::new(&config.output.database_path))?;

    match load_statistics(&store)? {
        Some(stats) => print_statistics(&stats),
        None => println!("No scrape runs recorded yet."),
    }

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    use almanac_scraper::output::{generate_markdown_summary, generate_summary, summary_path};
    use almanac_scraper::storage::open_storage;

    let db_path = Path::new(&config.output.database_path);
    let output_path = summary_path(db_path);

    println!("=== Exporting Scrape Summary ===\n");
    println!("Database: {}", db_path.display());
    println!("Output: {}", output_path.display());
    println!();

    let store = open_storage(db_path)?;

    tracing::info!("Loading run journal from database...");
    let summary = generate_summary(&store)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, &output_path)
        .with_context(|| format!("writing {}", output_path.display()))?;

    println!("✓ Summary exported to: {}", output_path.display());

    Ok(())
}

/// Handles the --clean mode: cleans every configured dataset
fn handle_clean(config: &Config) -> anyhow::Result<()> {
    use almanac_scraper::clean::clean_all;

    if config.datasets.is_empty() {
        anyhow::bail!("No [[dataset]] entries configured");
    }

    let results = clean_all(config);
    let mut failures = 0;
    for result in &results {
        match result {
            Ok(report) => {
                println!(
                    "✓ {}: {} -> {} rows ({})",
                    report.dataset,
                    report.rows_in,
                    report.rows_out,
                    report.output.display()
                );
                for (step, dropped) in &report.dropped_by_step {
                    println!("    {}: {} rows", step, dropped);
                }
            }
            Err(e) => {
                failures += 1;
                println!("✗ {}", e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} datasets failed to clean", failures, results.len());
    }
    Ok(())
}

/// Handles the --import mode: loads the cleaned datasets into SQLite
fn handle_import(config: &Config) -> anyhow::Result<()> {
    use almanac_scraper::storage::{import_all, open_storage};

    let db_path = Path::new(&config.output.database_path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let mut store = open_storage(db_path)?;
    let reports = import_all(&mut store, config)?;

    for report in &reports {
        println!(
            "✓ {}: {} rows loaded, {} dropped",
            report.table, report.rows_loaded, report.rows_dropped
        );
    }
    println!("\nAll datasets imported into {}", db_path.display());

    Ok(())
}

/// Handles the --shell mode: interactive SQL on stdin
fn handle_shell(config: &Config) -> anyhow::Result<()> {
    use almanac_scraper::shell::QueryShell;
    use almanac_scraper::storage::open_storage;

    let mut store = open_storage(Path::new(&config.output.database_path))?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    let mut shell = QueryShell::new(&mut store);
    shell.greet(&mut stdout)?;
    let executed = shell.run(stdin.lock(), &mut stdout)?;
    tracing::debug!("Shell executed {} statements", executed);

    Ok(())
}

/// Handles the --report mode: dashboard views of one cleaned dataset
fn handle_report(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    use almanac_scraper::output::{
        build_report, load_dataset, render_report, select_dataset, ReportFilter,
        NO_MATCH_WARNING,
    };

    let dataset = select_dataset(&config.datasets, cli.dataset.as_deref())?;
    let frame = load_dataset(Path::new(&config.output.cleaned_dir), dataset)
        .with_context(|| format!("loading dataset {}", dataset.name))?;

    let filter = ReportFilter::new(
        cli.years.clone(),
        cli.stats_filter.clone(),
        cli.players.clone(),
    );

    match build_report(&frame, &filter)? {
        Some(report) => render_report(dataset.display_name(), &report, &mut std::io::stdout())?,
        None => tracing::warn!("{}", NO_MATCH_WARNING),
    }

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Scraping {} (max {} attempts per year, restart every {} years)",
        config.scraper.index_url(),
        config.scraper.max_attempts,
        config.scraper.restart_every
    );

    match scrape_and_record(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Scrape completed: {} of {} years succeeded",
                summary.succeeded(),
                summary.outcomes.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
