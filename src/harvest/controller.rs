//! Scrape controller
//!
//! Walks the ordered year links one at a time with a single live session.
//!
//! # Retry and Restart Policy
//!
//! - A timeout earns another attempt until `max_attempts` is spent
//! - Any other failure abandons the year at once
//! - A pause separates consecutive years
//! - Every `restart_every` processed years the session is replaced
//!
//! Whatever happens, the session is released exactly once when the run ends.

use crate::config::ScraperConfig;
use crate::failure::log_failure;
use crate::harvest::processor::{YearReport, YearTask};
use crate::navigator::{Navigator, YearLink};
use crate::state::{YearProgress, YearState};
use crate::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Attempt, pause and restart settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
    pub restart_every: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            cooldown: Duration::from_millis(config.year_cooldown),
            restart_every: config.restart_every,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScraperConfig::default())
    }
}

/// Final state of one year
#[derive(Debug, Clone, PartialEq)]
pub struct YearOutcome {
    pub year: u16,
    pub url: String,
    pub state: YearState,
    pub attempts: u32,
    pub report: Option<YearReport>,
    pub error: Option<String>,
}

impl YearOutcome {
    pub fn tables_written(&self) -> usize {
        self.report.as_ref().map_or(0, |r| r.tables_written)
    }
}

/// Result of one controller run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcomes: Vec<YearOutcome>,
    pub restarts: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            outcomes: Vec::new(),
            restarts: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.count(YearState::Succeeded)
    }

    pub fn abandoned(&self) -> usize {
        self.count(YearState::Abandoned)
    }

    pub fn total_attempts(&self) -> u32 {
        self.outcomes.iter().map(|o| o.attempts).sum()
    }

    pub fn tables_written(&self) -> usize {
        self.outcomes.iter().map(YearOutcome::tables_written).sum()
    }

    fn count(&self, state: YearState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

/// Drives the year loop
pub struct Controller<T: YearTask> {
    navigator: Navigator,
    task: T,
    policy: RetryPolicy,
}

impl<T: YearTask> Controller<T> {
    pub fn new(navigator: Navigator, task: T, policy: RetryPolicy) -> Self {
        Self {
            navigator,
            task,
            policy,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    /// Processes `years` in ascending order and shuts the session down
    ///
    /// Only a failed first launch and broken state invariants end the run
    /// early. A session that cannot be relaunched later abandons the years
    /// it was needed for; those outcomes stay in the summary.
    pub async fn run(&mut self, years: &[YearLink]) -> Result<RunSummary> {
        let result = self.run_years(years).await;
        self.navigator.shutdown();
        result
    }

    async fn run_years(&mut self, years: &[YearLink]) -> Result<RunSummary> {
        if !self.navigator.has_session() {
            self.navigator.initialize()?;
        }

        let mut ordered: Vec<&YearLink> = years.iter().collect();
        ordered.sort_by_key(|link| link.year);

        let mut summary = RunSummary::start();
        let restart_every = self.policy.restart_every.max(1) as usize;

        for (index, link) in ordered.iter().enumerate() {
            let outcome = match self.ensure_session() {
                Ok(()) => self.run_year(link).await?,
                Err(e) => {
                    log_failure(
                        &format!("No browser session for year {}, skipping", link.year),
                        &e,
                    );
                    YearOutcome {
                        year: link.year,
                        url: link.url.clone(),
                        state: YearState::Abandoned,
                        attempts: 0,
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            summary.outcomes.push(outcome);

            let processed = index + 1;
            if processed < ordered.len() && !self.policy.cooldown.is_zero() {
                tokio::time::sleep(self.policy.cooldown).await;
            }

            if processed % restart_every == 0 {
                match self.navigator.restart() {
                    Ok(()) => summary.restarts += 1,
                    Err(e) => log_failure("Failed to restart browser session", &e),
                }
            }
        }

        summary.finished_at = Utc::now();
        Ok(summary)
    }

    /// Relaunches the session if a failed restart left none
    fn ensure_session(&mut self) -> Result<()> {
        if !self.navigator.has_session() {
            self.navigator.initialize()?;
        }
        Ok(())
    }

    async fn run_year(&mut self, link: &YearLink) -> Result<YearOutcome> {
        let mut progress = YearProgress::new(link.year, self.policy.max_attempts);
        let mut report = None;
        let mut last_error = None;

        while !progress.state().is_terminal() {
            let attempt = progress.begin_attempt()?;
            tracing::info!(
                "Scraping year {} at {} (Attempt {}/{})",
                link.year,
                link.url,
                attempt,
                self.policy.max_attempts
            );

            let session = self.navigator.session()?;
            match self.task.process_year(session, link).await {
                Ok(year_report) => {
                    progress.succeed()?;
                    report = Some(year_report);
                }
                Err(e) if e.is_retryable() => {
                    log_failure(&format!("Timeout on year {}", link.year), &e);
                    last_error = Some(e.to_string());
                    if progress.retryable_failure()? == YearState::Abandoned {
                        tracing::error!(
                            "Giving up on year {} after {} attempts",
                            link.year,
                            progress.attempts()
                        );
                    }
                }
                Err(e) => {
                    log_failure(
                        &format!("Unexpected error for year {}, skipping", link.year),
                        &e,
                    );
                    last_error = Some(e.to_string());
                    progress.abandon()?;
                }
            }
        }

        Ok(YearOutcome {
            year: link.year,
            url: link.url.clone(),
            state: progress.state(),
            attempts: progress.attempts(),
            report,
            error: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{Session, SessionLauncher};
    use crate::{ScrapeError, WaitStage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        launched: AtomicUsize,
        closed: AtomicUsize,
    }

    struct StubSession {
        id: u64,
        counters: Arc<Counters>,
        closed: bool,
    }

    #[async_trait]
    impl Session for StubSession {
        fn id(&self) -> u64 {
            self.id
        }

        async fn goto(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn wait_for_selector(&mut self, _selector: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        fn page_source(&self) -> Result<&str> {
            Ok("")
        }

        fn current_url(&self) -> Option<&str> {
            None
        }

        fn close(&mut self) {
            if !self.closed {
                self.closed = true;
                self.counters.closed.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    struct StubLauncher {
        counters: Arc<Counters>,
        max_launches: Option<usize>,
    }

    impl SessionLauncher for StubLauncher {
        fn launch(&self, _headless: bool) -> Result<Box<dyn Session>> {
            if let Some(max) = self.max_launches {
                if self.counters.launched.load(Ordering::SeqCst) >= max {
                    return Err(ScrapeError::Session("chrome failed to start".to_string()));
                }
            }
            let id = self.counters.launched.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            Ok(Box::new(StubSession {
                id,
                counters: self.counters.clone(),
                closed: false,
            }))
        }
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Timeout,
        Fail,
        Panic,
    }

    /// Scripted task: a behavior per year, success by default
    #[derive(Default)]
    struct ScriptedTask {
        script: HashMap<u16, Behavior>,
        calls: Vec<(u16, u64)>,
    }

    #[async_trait]
    impl YearTask for ScriptedTask {
        async fn process_year(
            &mut self,
            session: &mut dyn Session,
            link: &YearLink,
        ) -> Result<YearReport> {
            self.calls.push((link.year, session.id()));
            match self.script.get(&link.year).copied().unwrap_or(Behavior::Succeed) {
                Behavior::Succeed => Ok(YearReport {
                    year: link.year,
                    tables_found: 1,
                    tables_written: 1,
                    ..Default::default()
                }),
                Behavior::Timeout => Err(ScrapeError::Timeout {
                    url: link.url.clone(),
                    stage: WaitStage::TablePresence,
                }),
                Behavior::Fail => Err(ScrapeError::Status {
                    url: link.url.clone(),
                    status: 500,
                }),
                Behavior::Panic => panic!("year {} blew up", link.year),
            }
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            cooldown: Duration::ZERO,
            restart_every: 10,
        }
    }

    fn controller(task: ScriptedTask) -> (Controller<ScriptedTask>, Arc<Counters>) {
        limited_controller(task, None)
    }

    fn limited_controller(
        task: ScriptedTask,
        max_launches: Option<usize>,
    ) -> (Controller<ScriptedTask>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let launcher = StubLauncher {
            counters: counters.clone(),
            max_launches,
        };
        let navigator = Navigator::new(Box::new(launcher), &ScraperConfig::default(), true);
        (Controller::new(navigator, task, policy()), counters)
    }

    fn years(range: std::ops::RangeInclusive<u16>) -> Vec<YearLink> {
        range
            .map(|year| YearLink {
                year,
                url: format!("https://example.com/yearly/yr{}a.shtml", year),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_timeout_retried_once_then_next_year_runs() {
        let mut task = ScriptedTask::default();
        task.script.insert(1930, Behavior::Timeout);
        let (mut controller, _) = controller(task);

        let summary = controller.run(&years(1930..=1931)).await.unwrap();

        let calls: Vec<u16> = controller.task().calls.iter().map(|c| c.0).collect();
        assert_eq!(calls, vec![1930, 1930, 1931]);
        assert_eq!(summary.outcomes[0].state, YearState::Abandoned);
        assert_eq!(summary.outcomes[0].attempts, 2);
        assert!(summary.outcomes[0].error.as_ref().unwrap().contains("Timed out"));
        assert_eq!(summary.outcomes[1].state, YearState::Succeeded);
    }

    #[tokio::test]
    async fn test_non_timeout_failure_is_not_retried() {
        let mut task = ScriptedTask::default();
        task.script.insert(1945, Behavior::Fail);
        let (mut controller, _) = controller(task);

        let summary = controller.run(&years(1945..=1946)).await.unwrap();

        assert_eq!(summary.outcomes[0].attempts, 1);
        assert_eq!(summary.outcomes[0].state, YearState::Abandoned);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.abandoned(), 1);
    }

    #[tokio::test]
    async fn test_restart_every_ten_years() {
        let (mut controller, counters) = controller(ScriptedTask::default());

        let summary = controller.run(&years(1901..=1925)).await.unwrap();

        assert_eq!(summary.outcomes.len(), 25);
        assert_eq!(summary.restarts, 2);
        assert_eq!(counters.launched.load(Ordering::SeqCst), 3);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 3);

        // Years 11 and 21 run on a fresh session
        let calls = &controller.task().calls;
        assert_ne!(calls[9].1, calls[10].1);
        assert_eq!(calls[10].1, calls[19].1);
        assert_ne!(calls[19].1, calls[20].1);
    }

    #[tokio::test]
    async fn test_years_processed_in_ascending_order() {
        let (mut controller, _) = controller(ScriptedTask::default());
        let mut links = years(1901..=1903);
        links.reverse();

        controller.run(&links).await.unwrap();

        let calls: Vec<u16> = controller.task().calls.iter().map(|c| c.0).collect();
        assert_eq!(calls, vec![1901, 1902, 1903]);
    }

    #[tokio::test]
    async fn test_session_released_once_after_run() {
        let (mut controller, counters) = controller(ScriptedTask::default());
        controller.run(&years(1901..=1903)).await.unwrap();
        assert!(!controller.navigator().has_session());

        drop(controller);
        assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_released_on_panic() {
        let mut task = ScriptedTask::default();
        task.script.insert(1902, Behavior::Panic);
        let (mut controller, counters) = controller(task);

        let handle = tokio::spawn(async move {
            let links = years(1901..=1903);
            controller.run(&links).await.map(|s| s.outcomes.len())
        });
        let joined = handle.await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_year_list() {
        let (mut controller, counters) = controller(ScriptedTask::default());
        let summary = controller.run(&[]).await.unwrap();
        assert!(summary.outcomes.is_empty());
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_restart_keeps_collected_outcomes() {
        let (mut controller, counters) = limited_controller(ScriptedTask::default(), Some(1));

        let summary = controller.run(&years(1901..=1925)).await.unwrap();

        assert_eq!(summary.outcomes.len(), 25);
        assert_eq!(summary.succeeded(), 10);
        assert_eq!(summary.abandoned(), 15);
        assert_eq!(summary.restarts, 0);

        let skipped = &summary.outcomes[10];
        assert_eq!(skipped.year, 1911);
        assert_eq!(skipped.attempts, 0);
        assert!(skipped.error.as_ref().unwrap().contains("chrome failed to start"));

        // Only the first ten years ever reached the task
        assert_eq!(controller.task().calls.len(), 10);
        assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_relaunched_after_failed_restart() {
        let counters = Arc::new(Counters::default());
        let launcher = FlakyLauncher {
            inner: StubLauncher {
                counters: counters.clone(),
                max_launches: None,
            },
            attempts: AtomicUsize::new(0),
            fail_on: 2,
        };
        let navigator = Navigator::new(Box::new(launcher), &ScraperConfig::default(), true);
        let mut controller = Controller::new(navigator, ScriptedTask::default(), policy());

        let summary = controller.run(&years(1901..=1912)).await.unwrap();

        // The restart after year 10 fails; year 11 launches a fresh session
        assert_eq!(summary.restarts, 0);
        assert_eq!(summary.succeeded(), 12);
        assert_eq!(counters.launched.load(Ordering::SeqCst), 2);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 2);
    }

    /// Fails exactly the `fail_on`-th launch attempt
    struct FlakyLauncher {
        inner: StubLauncher,
        attempts: AtomicUsize,
        fail_on: usize,
    }

    impl SessionLauncher for FlakyLauncher {
        fn launch(&self, headless: bool) -> Result<Box<dyn Session>> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt == self.fail_on {
                return Err(ScrapeError::Session("chrome failed to start".to_string()));
            }
            self.inner.launch(headless)
        }
    }
}
