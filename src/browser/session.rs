//! Session traits
//!
//! A session is the one live browser handle the scraper drives. The Navigator
//! owns it exclusively; the Year Processor borrows it for one year at a time.

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A live browser handle
#[async_trait]
pub trait Session: Send {
    /// Identifier assigned by the launcher, unique per process
    fn id(&self) -> u64;

    /// Loads `url`, bounded by the session's page-load timeout
    ///
    /// A load that exceeds the bound fails with `ScrapeError::Timeout`.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Waits until the current page contains an element matching `selector`
    ///
    /// Fails with `ScrapeError::Timeout` once `timeout` has elapsed.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Markup of the currently loaded page
    fn page_source(&self) -> Result<&str>;

    /// URL of the currently loaded page, if any
    fn current_url(&self) -> Option<&str>;

    /// Releases all resources held by the session
    ///
    /// Must be safe to call on a broken or already closed session.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Creates sessions on demand
pub trait SessionLauncher: Send + Sync {
    /// Launches a new session
    ///
    /// # Arguments
    ///
    /// * `headless` - Whether the browser should run without a visible window
    fn launch(&self, headless: bool) -> Result<Box<dyn Session>>;
}
