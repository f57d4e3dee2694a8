use crate::config::types::{BackendKind, BrowserConfig, Config, DatasetEntry, OutputConfig, ScraperConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    validate_datasets(&config.datasets)?;
    Ok(())
}

/// Validates scrape loop configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if config.league_label.trim().is_empty() {
        return Err(ConfigError::Validation(
            "league_label cannot be empty".to_string(),
        ));
    }

    // The label is spliced into an attribute selector
    if config.league_label.contains('"') || config.league_label.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "league_label must not contain quotes or backslashes, got '{}'",
            config.league_label
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.restart_every < 1 {
        return Err(ConfigError::Validation(format!(
            "restart_every must be >= 1, got {}",
            config.restart_every
        )));
    }

    if config.table_wait_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "table_wait_timeout must be >= 100ms, got {}ms",
            config.table_wait_timeout
        )));
    }

    if let (Some(first), Some(last)) = (config.first_year, config.last_year) {
        if first > last {
            return Err(ConfigError::Validation(format!(
                "first_year ({}) must not be after last_year ({})",
                first, last
            )));
        }
    }

    Ok(())
}

/// Validates browser session configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if config.page_load_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "page_load_timeout must be >= 100ms, got {}ms",
            config.page_load_timeout
        )));
    }

    if config.backend == BackendKind::Browserless {
        match &config.browserless_url {
            Some(url) => validate_http_url("browserless_url", url)?,
            None => {
                return Err(ConfigError::Validation(
                    "browserless_url is required when backend = \"browserless\"".to_string(),
                ))
            }
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.scraped_dir.is_empty() {
        return Err(ConfigError::Validation(
            "scraped_dir cannot be empty".to_string(),
        ));
    }

    if config.cleaned_dir.is_empty() {
        return Err(ConfigError::Validation(
            "cleaned_dir cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates dataset entries
fn validate_datasets(datasets: &[DatasetEntry]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut tables = HashSet::new();

    for entry in datasets {
        if entry.name.is_empty() {
            return Err(ConfigError::Validation(
                "dataset name cannot be empty".to_string(),
            ));
        }

        validate_table_identifier(&entry.table)?;

        if !names.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "dataset '{}' is listed more than once",
                entry.name
            )));
        }

        if !tables.insert(entry.table.as_str()) {
            return Err(ConfigError::Validation(format!(
                "table '{}' is used by more than one dataset",
                entry.table
            )));
        }
    }

    Ok(())
}

/// Table names are interpolated into DDL, so only plain identifiers pass
fn validate_table_identifier(table: &str) -> Result<(), ConfigError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if !valid {
        return Err(ConfigError::Validation(format!(
            "table '{}' must be a plain identifier ([A-Za-z_][A-Za-z0-9_]*)",
            table
        )));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
