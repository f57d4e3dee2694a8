//! Navigator: session lifecycle and year discovery
//!
//! The Navigator owns the single live browser session. It launches it,
//! restarts it on demand, discovers the per-year links on the index page and
//! releases the session when the scrape ends, including on early return or
//! unwind through `Drop`.

mod links;

pub use links::{extract_year_links, ordered_links, year_link_selector, YearLink};

use crate::browser::{Session, SessionLauncher};
use crate::config::ScraperConfig;
use crate::failure::log_failure;
use crate::{Result, ScrapeError};
use std::collections::BTreeMap;

/// Drives the browser session for one scrape
pub struct Navigator {
    launcher: Box<dyn SessionLauncher>,
    headless: bool,
    base_url: String,
    index_url: String,
    league_label: String,
    session: Option<Box<dyn Session>>,
    launches: usize,
    restarts: usize,
}

impl Navigator {
    /// Creates a navigator without launching a session yet
    pub fn new(launcher: Box<dyn SessionLauncher>, config: &ScraperConfig, headless: bool) -> Self {
        Self {
            launcher,
            headless,
            base_url: config.base_url.clone(),
            index_url: config.index_url(),
            league_label: config.league_label.clone(),
            session: None,
            launches: 0,
            restarts: 0,
        }
    }

    /// Launches a session, replacing (and closing) any live one
    pub fn initialize(&mut self) -> Result<&mut dyn Session> {
        self.shutdown();

        let session = self.launcher.launch(self.headless)?;
        self.launches += 1;
        let session = self.session.insert(session);
        Ok(session.as_mut())
    }

    /// Borrows the live session
    pub fn session(&mut self) -> Result<&mut dyn Session> {
        match self.session.as_mut() {
            Some(session) => Ok(session.as_mut()),
            None => Err(ScrapeError::Session("no live session".to_string())),
        }
    }

    /// Returns true if a session is currently live
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Loads the index page and returns `year -> url` for the league
    ///
    /// Failures are logged and produce an empty map; the caller decides
    /// whether an empty result is fatal.
    pub async fn fetch_year_links(&mut self) -> BTreeMap<u16, String> {
        tracing::info!("Accessing main page: {}", self.index_url);

        match self.try_fetch_year_links().await {
            Ok(links) => links,
            Err(e) => {
                log_failure("Failed to extract year links", &e);
                BTreeMap::new()
            }
        }
    }

    async fn try_fetch_year_links(&mut self) -> Result<BTreeMap<u16, String>> {
        let Some(session) = self.session.as_mut() else {
            return Err(ScrapeError::Session("no live session".to_string()));
        };
        session.goto(&self.index_url).await?;
        let html = session.page_source()?;
        extract_year_links(html, &self.base_url, &self.league_label)
    }

    /// Destroys the live session and launches a fresh one
    pub fn restart(&mut self) -> Result<()> {
        tracing::info!("Restarting browser session to avoid a stale session");
        self.initialize()?;
        self.restarts += 1;
        Ok(())
    }

    /// Releases the live session, if any
    ///
    /// Safe to call repeatedly and on a broken session.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            tracing::debug!(session = session.id(), "Shutting down browser session");
            session.close();
        }
    }

    /// Number of sessions launched so far
    pub fn launches(&self) -> usize {
        self.launches
    }

    /// Number of periodic restarts performed so far
    pub fn restarts(&self) -> usize {
        self.restarts
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
