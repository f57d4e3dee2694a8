//! Browser session module
//!
//! This module provides the session abstraction the scraper drives and its
//! HTTP-backed implementation:
//! - `Session` / `SessionLauncher` traits
//! - Direct HTTP sessions with a spoofed browser identity
//! - Browserless-rendered sessions with viewport and selector waits

mod http;
mod session;

pub use http::{build_http_client, document_matches, HttpLauncher, HttpSession};
pub use session::{Session, SessionLauncher};

use crate::config::BrowserConfig;

/// Builds the launcher described by the browser configuration
pub fn launcher_from_config(config: &BrowserConfig) -> Box<dyn SessionLauncher> {
    Box::new(HttpLauncher::new(config.clone()))
}
