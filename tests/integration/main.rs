//! Integration tests for the scraper
//!
//! These tests use wiremock to stand in for the almanac site and drive the
//! navigator, the controller and the full scrape end-to-end.

use almanac_scraper::browser::launcher_from_config;
use almanac_scraper::config::{parse_config, Config};
use almanac_scraper::harvest::{run_scrape, scrape_and_record};
use almanac_scraper::output::generate_summary;
use almanac_scraper::storage::{SqliteStore, Store};
use almanac_scraper::{Navigator, ScrapeError, YearState};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Year menu with two American League links, one National League link and
/// one non-year label
fn index_page() -> String {
    r#"<html><body><table><tr>
        <td class="datacolBox"><a href="/yearly/yr1901a.shtml" title="1901 in the American League">1901</a></td>
        <td class="datacolBox"><a href="yearly/yr1902a.shtml" title="1902 in the American League">1902</a></td>
        <td class="datacolBox"><a href="/yearly/yr1902n.shtml" title="1902 in the National League">1902</a></td>
        <td class="datacolBox"><a href="/yearly/al.shtml" title="History in the American League">History</a></td>
    </tr></table></body></html>"#
        .to_string()
}

fn season_page(year: u16) -> String {
    format!(
        r#"<html><body>
        <table>
            <tr><td class="header">{year} American League Pitcher Review</td></tr>
            <tr><td>Statistic</td><td>Name(s)</td><td>Team</td><td>#</td></tr>
            <tr><td>Wins</td><td>Cy Young</td><td>Boston</td><td>33</td></tr>
        </table>
        </body></html>"#
    )
}

/// Builds a validated config pointing at the mock server
fn test_config(base_url: &str, dir: &Path, extra_scraper: &str) -> Config {
    config_with_wait(base_url, dir, 200, extra_scraper)
}

fn config_with_wait(base_url: &str, dir: &Path, table_wait: u64, extra_scraper: &str) -> Config {
    let toml = format!(
        r#"
[scraper]
base-url = "{base_url}"
year-cooldown = 0
table-wait-timeout = {table_wait}
{extra_scraper}

[browser]
backend = "http"
page-load-timeout = 2000

[output]
scraped-dir = "{scraped}"
cleaned-dir = "{cleaned}"
database-path = "{db}"
"#,
        scraped = dir.join("scraped").display(),
        cleaned = dir.join("cleaned").display(),
        db = dir.join("db").join("test.sqlite").display(),
    );
    parse_config(&toml).expect("test config should be valid")
}

async fn mount_index(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/yearmenu.shtml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(index_page())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_season(server: &MockServer, year: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/yearly/yr{}a.shtml", year)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(season_page(year))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_navigator_discovers_league_years() {
    let server = MockServer::start().await;
    mount_index(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "");

    let mut navigator = Navigator::new(
        launcher_from_config(&config.browser),
        &config.scraper,
        config.browser.headless,
    );
    navigator.initialize().unwrap();
    let links = navigator.fetch_year_links().await;

    assert_eq!(links.len(), 2);
    assert_eq!(links[&1901], format!("{}/yearly/yr1901a.shtml", server.uri()));
    assert_eq!(links[&1902], format!("{}/yearly/yr1902a.shtml", server.uri()));

    navigator.shutdown();
    assert!(!navigator.has_session());
}

#[tokio::test]
async fn test_missing_index_is_structure_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/yearmenu.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "");

    let err = run_scrape(&config).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Structure(_)));
}

#[tokio::test]
async fn test_full_scrape_writes_destinations() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_season(&server, 1901).await;
    mount_season(&server, 1902).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "");

    let summary = run_scrape(&config).await.unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.outcomes[0].year, 1901);
    assert_eq!(summary.outcomes[1].year, 1902);

    let csv_path = dir
        .path()
        .join("scraped")
        .join("American_League_Pitcher_Review.csv");
    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert!(content.lines().any(|l| l.starts_with("1901,Wins,Cy Young")));
    assert!(content.lines().any(|l| l.starts_with("1902,Wins,Cy Young")));
    assert!(content.lines().all(|l| l.starts_with("1901,") || l.starts_with("1902,")));
}

#[tokio::test]
async fn test_year_range_limits_processing() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_season(&server, 1902).await;
    Mock::given(method("GET"))
        .and(path("/yearly/yr1901a.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(season_page(1901)))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "first-year = 1902");

    let summary = run_scrape(&config).await.unwrap();
    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.outcomes[0].year, 1902);
}

#[tokio::test]
async fn test_missing_tables_retried_then_abandoned() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_season(&server, 1902).await;

    // The page loads but never shows a table, so every attempt times out
    Mock::given(method("GET"))
        .and(path("/yearly/yr1901a.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>Loading</p></body></html>"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "");

    let summary = run_scrape(&config).await.unwrap();

    let first = &summary.outcomes[0];
    assert_eq!(first.year, 1901);
    assert_eq!(first.state, YearState::Abandoned);
    assert_eq!(first.attempts, 2);

    // The abandoned year does not stop the loop
    assert_eq!(summary.outcomes[1].state, YearState::Succeeded);
}

#[tokio::test]
async fn test_static_page_fetched_once_per_attempt() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_season(&server, 1902).await;

    // A long table wait must not turn into repeated fetches of the same page
    Mock::given(method("GET"))
        .and(path("/yearly/yr1901a.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>Loading</p></body></html>"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_with_wait(&server.uri(), dir.path(), 5000, "");

    let summary = run_scrape(&config).await.unwrap();

    let first = &summary.outcomes[0];
    assert_eq!(first.year, 1901);
    assert_eq!(first.state, YearState::Abandoned);
    assert_eq!(first.attempts, 2);
    assert!(first.error.as_deref().unwrap().contains("table"));
    assert_eq!(summary.outcomes[1].state, YearState::Succeeded);
}

#[tokio::test]
async fn test_slow_page_load_is_retried() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_season(&server, 1902).await;
    Mock::given(method("GET"))
        .and(path("/yearly/yr1901a.shtml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(season_page(1901))
                .set_delay(Duration::from_secs(5)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "");

    let summary = run_scrape(&config).await.unwrap();
    assert_eq!(summary.outcomes[0].state, YearState::Abandoned);
    assert_eq!(summary.outcomes[0].attempts, 2);
    assert!(summary.outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .contains("Timed out loading page"));
}

#[tokio::test]
async fn test_server_error_abandons_without_retry() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_season(&server, 1902).await;
    Mock::given(method("GET"))
        .and(path("/yearly/yr1901a.shtml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "");

    let summary = run_scrape(&config).await.unwrap();
    assert_eq!(summary.outcomes[0].state, YearState::Abandoned);
    assert_eq!(summary.outcomes[0].attempts, 1);
    assert_eq!(summary.succeeded(), 1);
}

#[tokio::test]
async fn test_scrape_is_journaled() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_season(&server, 1901).await;
    mount_season(&server, 1902).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), "");

    scrape_and_record(&config, "integration").await.unwrap();

    let store = SqliteStore::new(Path::new(&config.output.database_path)).unwrap();
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, "integration");
    assert_eq!(store.get_outcomes(run.id).unwrap().len(), 2);

    let digest = generate_summary(&store).unwrap();
    assert_eq!(digest.years_succeeded, 2);
    assert_eq!(digest.status, "completed");
}
