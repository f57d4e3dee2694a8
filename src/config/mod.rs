//! Configuration module for Almanac-Scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use almanac_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Years will be retried up to {} times", config.scraper.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BackendKind, BrowserConfig, Config, DatasetEntry, OutputConfig, ScraperConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
