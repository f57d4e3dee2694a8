//! Year link extraction from the index page
//!
//! The year menu lists every season for every league in `td.datacolBox`
//! cells. Links are told apart by their `title` attribute, e.g.
//! "Baseball History in 1901 in the American League".

use crate::{Result, ScrapeError};
use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// One season page to process
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearLink {
    pub year: u16,
    pub url: String,
}

/// Builds the selector for year links of one league
pub fn year_link_selector(league_label: &str) -> String {
    format!(r#"td.datacolBox a[title*="{}"]"#, league_label)
}

/// Extracts `year -> absolute URL` from the index page markup
///
/// # Link Extraction Rules
///
/// - Only anchors matching `td.datacolBox a[title*="<league_label>"]`
/// - The trimmed link text must be a decimal year
/// - The anchor must carry an `href`
/// - Absolute `http(s)` hrefs are kept as-is; anything else is joined onto
///   `base_url` after stripping leading slashes
///
/// A year that appears more than once keeps its last link.
///
/// # Example
///
/// ```
/// use almanac_scraper::navigator::extract_year_links;
///
/// let html = r#"<table><tr><td class="datacolBox">
///     <a href="/yearly/yr1901a.shtml" title="1901 in the American League">1901</a>
/// </td></tr></table>"#;
/// let links = extract_year_links(html, "https://www.baseball-almanac.com", "in the American League").unwrap();
/// assert_eq!(links[&1901], "https://www.baseball-almanac.com/yearly/yr1901a.shtml");
/// ```
pub fn extract_year_links(
    html: &str,
    base_url: &str,
    league_label: &str,
) -> Result<BTreeMap<u16, String>> {
    let selector_text = year_link_selector(league_label);
    let selector = Selector::parse(&selector_text).map_err(|e| {
        ScrapeError::Structure(format!("invalid year link selector '{}': {:?}", selector_text, e))
    })?;

    let document = Html::parse_document(html);
    let mut links = BTreeMap::new();
    let mut matched = 0usize;

    for element in document.select(&selector) {
        matched += 1;

        let text = element.text().collect::<String>();
        let text = text.trim();
        let Some(year) = parse_year(text) else {
            continue;
        };

        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() {
            continue;
        }

        links.insert(year, absolutize(href, base_url));
    }

    tracing::debug!("Found {} year links ({} usable)", matched, links.len());

    Ok(links)
}

/// Converts the extracted map into links ordered by ascending year
pub fn ordered_links(links: &BTreeMap<u16, String>) -> Vec<YearLink> {
    links
        .iter()
        .map(|(year, url)| YearLink {
            year: *year,
            url: url.clone(),
        })
        .collect()
}

/// Accepts only all-digit labels that fit a year
fn parse_year(text: &str) -> Option<u16> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn absolutize(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}
