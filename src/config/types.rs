use serde::Deserialize;

/// Main configuration structure for Almanac-Scraper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "dataset")]
    pub datasets: Vec<DatasetEntry>,
}

/// Scrape loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Site root; relative year links are resolved against it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the year index page under `base_url`
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Substring of the link `title` attribute that selects the league
    #[serde(default = "default_league_label")]
    pub league_label: String,

    /// Attempts per year before it is abandoned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Number of processed years between forced session restarts
    #[serde(default = "default_restart_every")]
    pub restart_every: u32,

    /// Pause after each year (milliseconds)
    #[serde(default = "default_year_cooldown")]
    pub year_cooldown: u64,

    /// Bound on waiting for a table element to appear (milliseconds)
    #[serde(default = "default_table_wait_timeout")]
    pub table_wait_timeout: u64,

    /// First year to process (inclusive)
    #[serde(default)]
    pub first_year: Option<u16>,

    /// Last year to process (inclusive)
    #[serde(default)]
    pub last_year: Option<u16>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_path: default_index_path(),
            league_label: default_league_label(),
            max_attempts: default_max_attempts(),
            restart_every: default_restart_every(),
            year_cooldown: default_year_cooldown(),
            table_wait_timeout: default_table_wait_timeout(),
            first_year: None,
            last_year: None,
        }
    }
}

impl ScraperConfig {
    /// Absolute URL of the year index page
    pub fn index_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.index_path.trim_start_matches('/')
        )
    }

    /// Returns true if `year` falls inside the configured range
    pub fn includes_year(&self, year: u16) -> bool {
        self.first_year.map_or(true, |first| year >= first)
            && self.last_year.map_or(true, |last| year <= last)
    }
}

/// Which session implementation drives page loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Plain HTTP fetches with a spoofed browser identity
    Http,
    /// Pages rendered by a remote Browserless instance
    Browserless,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Client identifier sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Bound on a single page load (milliseconds)
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout: u64,

    /// Browserless endpoint root, required for the browserless backend
    #[serde(default)]
    pub browserless_url: Option<String>,

    #[serde(default)]
    pub browserless_token: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            headless: default_headless(),
            user_agent: default_user_agent(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            page_load_timeout: default_page_load_timeout(),
            browserless_url: None,
            browserless_token: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding one append-only CSV per table title
    #[serde(default = "default_scraped_dir")]
    pub scraped_dir: String,

    /// Directory receiving the cleaned dataset CSVs
    #[serde(default = "default_cleaned_dir")]
    pub cleaned_dir: String,

    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scraped_dir: default_scraped_dir(),
            cleaned_dir: default_cleaned_dir(),
            database_path: default_database_path(),
        }
    }
}

/// A scraped destination that gets cleaned, imported and reported on
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetEntry {
    /// Sanitized table title, e.g. "American_League_Pitcher_Review"
    pub name: String,

    /// SQLite table the cleaned rows are imported into
    pub table: String,

    /// Human-readable name used by reports
    #[serde(default)]
    pub label: Option<String>,
}

impl DatasetEntry {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

fn default_base_url() -> String {
    "https://www.baseball-almanac.com".to_string()
}

fn default_index_path() -> String {
    "/yearmenu.shtml".to_string()
}

fn default_league_label() -> String {
    "in the American League".to_string()
}

fn default_max_attempts() -> u32 {
    2
}

fn default_restart_every() -> u32 {
    10
}

fn default_year_cooldown() -> u64 {
    4000
}

fn default_table_wait_timeout() -> u64 {
    10_000
}

fn default_backend() -> BackendKind {
    BackendKind::Http
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/113.0".to_string()
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_page_load_timeout() -> u64 {
    20_000
}

fn default_scraped_dir() -> String {
    "scraped_data".to_string()
}

fn default_cleaned_dir() -> String {
    "cleaned_data".to_string()
}

fn default_database_path() -> String {
    "db/baseball_data.sqlite".to_string()
}
