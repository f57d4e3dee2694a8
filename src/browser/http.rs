//! HTTP-backed session implementation
//!
//! This module provides the session used in production:
//! - Building HTTP clients with the spoofed browser identity
//! - Loading pages directly or through a Browserless `/content` endpoint
//! - Classifying failures into timeouts and everything else
//! - Checking for a selector, re-rendering through Browserless until a bound

use crate::browser::session::{Session, SessionLauncher};
use crate::config::{BackendKind, BrowserConfig};
use crate::{Result, ScrapeError, WaitStage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Delay between Browserless re-renders while waiting for a selector
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Extra client-side allowance on top of the Browserless navigation timeout
const BROWSERLESS_SLACK: Duration = Duration::from_secs(5);

/// Launches [`HttpSession`]s from the browser configuration
pub struct HttpLauncher {
    config: BrowserConfig,
    next_id: AtomicU64,
}

impl HttpLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
        }
    }
}

impl SessionLauncher for HttpLauncher {
    fn launch(&self, headless: bool) -> Result<Box<dyn Session>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if !headless && self.config.backend == BackendKind::Http {
            tracing::warn!(session = id, "HTTP backend has no visible window; running headless");
        }

        let client = build_http_client(&self.config)?;

        tracing::info!(
            session = id,
            backend = ?self.config.backend,
            headless,
            "Launched browser session ({}x{})",
            self.config.window_width,
            self.config.window_height
        );

        Ok(Box::new(HttpSession {
            id,
            client: Some(client),
            config: self.config.clone(),
            headless,
            page: None,
        }))
    }
}

/// Builds an HTTP client with the configured identity and timeouts
///
/// # Arguments
///
/// * `config` - The browser configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &BrowserConfig) -> std::result::Result<Client, reqwest::Error> {
    let page_load = Duration::from_millis(config.page_load_timeout);
    let timeout = match config.backend {
        BackendKind::Http => page_load,
        // Browserless enforces the navigation bound itself and reports it
        BackendKind::Browserless => page_load + BROWSERLESS_SLACK,
    };

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(page_load.min(Duration::from_secs(10)))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// A loaded page
#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    body: String,
}

/// Session backed by a reqwest client
pub struct HttpSession {
    id: u64,
    client: Option<Client>,
    config: BrowserConfig,
    headless: bool,
    page: Option<LoadedPage>,
}

impl HttpSession {
    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| ScrapeError::Session(format!("session {} is closed", self.id)))
    }

    /// Fetches `url`, optionally asking the renderer to wait for `wait_for`
    async fn load(&self, url: &str, wait_for: Option<(&str, Duration)>) -> Result<String> {
        let client = self.client()?;

        let request = match self.config.backend {
            BackendKind::Http => client.get(url),
            BackendKind::Browserless => {
                let endpoint = browserless_endpoint(&self.config, self.headless)?;
                client
                    .post(endpoint)
                    .json(&content_request(url, &self.config, wait_for))
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if status == StatusCode::REQUEST_TIMEOUT {
            return Err(ScrapeError::Timeout {
                url: url.to_string(),
                stage: WaitStage::PageLoad,
            });
        }
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))
    }

    fn current_page(&self) -> Result<&LoadedPage> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Session(format!("session {} has no page loaded", self.id)))
    }
}

#[async_trait]
impl Session for HttpSession {
    fn id(&self) -> u64 {
        self.id
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        tracing::debug!(session = self.id, "Navigating to {}", url);
        let body = self.load(url, None).await?;
        self.page = Some(LoadedPage {
            url: url.to_string(),
            body,
        });
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let url = self.current_page()?.url.clone();
        let timed_out = ScrapeError::Timeout {
            url: url.clone(),
            stage: WaitStage::TablePresence,
        };

        // A directly fetched page is static; only a renderer can change it
        if self.config.backend == BackendKind::Http {
            return if document_matches(&self.current_page()?.body, selector)? {
                Ok(())
            } else {
                Err(timed_out)
            };
        }

        let poll = async {
            loop {
                if document_matches(&self.current_page()?.body, selector)? {
                    return Ok::<(), ScrapeError>(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
                let body = self.load(&url, Some((selector, timeout))).await?;
                self.page = Some(LoadedPage {
                    url: url.clone(),
                    body,
                });
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(timed_out),
        }
    }

    fn page_source(&self) -> Result<&str> {
        Ok(&self.current_page()?.body)
    }

    fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|page| page.url.as_str())
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::info!(session = self.id, "Closed browser session");
        }
        self.page = None;
    }

    fn is_closed(&self) -> bool {
        self.client.is_none()
    }
}

/// Maps a reqwest failure to the scrape taxonomy
fn classify_transport_error(url: &str, err: reqwest::Error) -> ScrapeError {
    if err.is_timeout() {
        ScrapeError::Timeout {
            url: url.to_string(),
            stage: WaitStage::PageLoad,
        }
    } else {
        ScrapeError::Http {
            url: url.to_string(),
            source: err,
        }
    }
}

/// Checks whether `html` contains an element matching `selector`
pub fn document_matches(html: &str, selector: &str) -> Result<bool> {
    let selector = Selector::parse(selector)
        .map_err(|e| ScrapeError::Session(format!("invalid selector '{}': {:?}", selector, e)))?;
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

/// Builds the Browserless `/content` URL with token and launch options
fn browserless_endpoint(config: &BrowserConfig, headless: bool) -> Result<url::Url> {
    let base = config
        .browserless_url
        .as_deref()
        .ok_or_else(|| ScrapeError::Session("browserless_url is not configured".to_string()))?;

    let mut endpoint = url::Url::parse(&format!("{}/content", base.trim_end_matches('/')))?;
    {
        let mut query = endpoint.query_pairs_mut();
        if let Some(token) = &config.browserless_token {
            query.append_pair("token", token);
        }
        query.append_pair("launch", &json!({ "headless": headless }).to_string());
    }
    Ok(endpoint)
}

/// Body of a Browserless `/content` request
fn content_request(
    url: &str,
    config: &BrowserConfig,
    wait_for: Option<(&str, Duration)>,
) -> serde_json::Value {
    let mut body = json!({
        "url": url,
        "userAgent": config.user_agent,
        "viewport": {
            "width": config.window_width,
            "height": config.window_height,
        },
        "gotoOptions": {
            "timeout": config.page_load_timeout,
            "waitUntil": "domcontentloaded",
        },
    });

    if let Some((selector, timeout)) = wait_for {
        body["waitForSelector"] = json!({
            "selector": selector,
            "timeout": timeout.as_millis() as u64,
        });
    }

    body
}
