//! Almanac-Scraper: American League history harvester
//!
//! This crate scrapes per-year American League tables from baseball-almanac.com,
//! normalises their drifting schemas, and feeds the cleaning, SQLite import,
//! query shell and reporting stages that sit downstream of the scrape.

pub mod browser;
pub mod clean;
pub mod config;
pub mod failure;
pub mod harvest;
pub mod navigator;
pub mod output;
pub mod shell;
pub mod state;
pub mod storage;

use std::fmt;
use thiserror::Error;

/// Main error type for scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Timed out {stage} for {url}")]
    Timeout { url: String, stage: WaitStage },

    #[error("Site structure error: {0}")]
    Structure(String),

    #[error("Failed to parse table '{title}': {message}")]
    Parse { title: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Invalid year state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::YearState,
        to: state::YearState,
    },

    #[error("Cleaning error: {0}")]
    Clean(#[from] clean::CleanError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which bounded wait expired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    /// The page itself did not finish loading
    PageLoad,
    /// The page loaded but no table appeared in time
    TablePresence,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageLoad => write!(f, "loading page"),
            Self::TablePresence => write!(f, "waiting for tables"),
        }
    }
}

/// Coarse failure classes that drive retry and propagation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Page load or table wait exceeded its bound; retryable
    Timeout,
    /// Expected elements are absent; fatal at startup
    Structure,
    /// One table could not be converted; that table is skipped
    Parse,
    /// Anything else; the current year is abandoned
    Unexpected,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::Structure => "StructureError",
            Self::Parse => "ParseError",
            Self::Unexpected => "UnexpectedError",
        }
    }
}

impl ScrapeError {
    /// Classifies this error for the retry/propagation policy
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Timeout { .. } => ErrorClass::Timeout,
            Self::Structure(_) => ErrorClass::Structure,
            Self::Parse { .. } => ErrorClass::Parse,
            _ => ErrorClass::Unexpected,
        }
    }

    /// Only timeouts are worth another attempt with the same session
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Timeout
    }

    /// Short variant name used in structured log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "Config",
            Self::Timeout { .. } => "Timeout",
            Self::Structure(_) => "Structure",
            Self::Parse { .. } => "Parse",
            Self::Http { .. } => "Http",
            Self::Status { .. } => "Status",
            Self::Session(_) => "Session",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::Clean(_) => "Clean",
            Self::Database(_) => "Database",
            Self::Storage(_) => "Storage",
            Self::Output(_) => "Output",
            Self::UrlParse(_) => "UrlParse",
            Self::Reqwest(_) => "Reqwest",
            Self::Csv(_) => "Csv",
            Self::Io(_) => "Io",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use navigator::{Navigator, YearLink};
pub use harvest::{clean_title, run_scrape, sanitize_title, RunSummary};
pub use state::YearState;
