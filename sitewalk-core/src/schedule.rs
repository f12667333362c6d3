// Periodic crawl task and the single-slot scheduler that owns it

use crate::agent::{CrawlRecords, SharedAgentState};
use crate::config::{DEFAULT_REPORT_PREFIX, DEFAULT_TIMEOUT_SECS, OutputFormat};
use crate::error::Result;
use crate::report;
use futures::future::BoxFuture;
use sitewalk_scanner::{Crawler, StatusMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs one crawl on behalf of the scheduler or the relay.
pub trait CrawlRunner: Send + Sync {
    fn run<'a>(&'a self, target: &'a str, max_concurrent: usize) -> BoxFuture<'a, Result<StatusMap>>;
}

pub type SharedRunner = Arc<dyn CrawlRunner>;

/// Crawls over HTTP and, when a results directory is set, writes the JSON
/// status reports for every run.
#[derive(Debug, Clone)]
pub struct HttpCrawlRunner {
    results_dir: Option<PathBuf>,
    prefix: String,
    timeout_secs: u64,
}

impl Default for HttpCrawlRunner {
    fn default() -> Self {
        Self {
            results_dir: None,
            prefix: DEFAULT_REPORT_PREFIX.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpCrawlRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(dir.into());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    async fn crawl_and_save(&self, target: &str, max_concurrent: usize) -> Result<StatusMap> {
        let crawler = Crawler::with_timeout(self.timeout_secs)?;
        let output = crawler.crawl(target, max_concurrent).await?;

        if let Some(dir) = &self.results_dir {
            let (ok, failing) = report::split_by_status(&output.status);
            let paths =
                report::write_report_blocking(ok, failing, OutputFormat::Json, dir.join(&self.prefix))
                    .await?;
            debug!("Reports written to {} and {}", paths.ok.display(), paths.failing.display());
        }

        Ok(output.status)
    }
}

impl CrawlRunner for HttpCrawlRunner {
    fn run<'a>(&'a self, target: &'a str, max_concurrent: usize) -> BoxFuture<'a, Result<StatusMap>> {
        Box::pin(self.crawl_and_save(target, max_concurrent))
    }
}

/// A running periodic crawl. Dropping the handle does not stop the task; call
/// [`PeriodicCrawl::stop`].
#[derive(Debug)]
pub struct PeriodicCrawl {
    target: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicCrawl {
    /// Spawns a task that crawls immediately, records the result, sleeps
    /// `interval` and repeats until stopped.
    pub fn start(
        target: &str,
        interval: Duration,
        max_concurrent: usize,
        state: SharedAgentState,
        runner: SharedRunner,
    ) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let task_target = target.to_string();

        let handle = tokio::spawn(async move {
            info!("Periodic crawl of {} every {:?}", task_target, interval);
            loop {
                let records = tokio::select! {
                    _ = task_token.cancelled() => break,
                    result = runner.run(&task_target, max_concurrent) => match result {
                        Ok(status) => CrawlRecords::from_status(&status),
                        Err(e) => {
                            warn!("Periodic crawl of {} failed: {}", task_target, e);
                            CrawlRecords::failed(e.to_string())
                        }
                    },
                };

                state.record_crawl(records).await;
                info!("Periodic crawl of {} complete", task_target);

                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("Periodic crawl of {} stopped", task_target);
        });

        Self {
            target: target.to_string(),
            token,
            handle,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the task and waits for it to exit.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!("Periodic crawl task ended abnormally: {}", e);
        }
    }
}

/// Holds at most one active periodic crawl.
#[derive(Debug, Default)]
pub struct Scheduler {
    active: Mutex<Option<PeriodicCrawl>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a schedule, stopping the previous one first.
    pub async fn start(
        &self,
        target: &str,
        interval: Duration,
        max_concurrent: usize,
        state: SharedAgentState,
        runner: SharedRunner,
    ) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            info!("Replacing periodic crawl of {}", previous.target());
            previous.stop().await;
        }
        *active = Some(PeriodicCrawl::start(
            target,
            interval,
            max_concurrent,
            state,
            runner,
        ));
    }

    /// Returns whether a schedule was running.
    pub async fn stop(&self) -> bool {
        match self.active.lock().await.take() {
            Some(schedule) => {
                schedule.stop().await;
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|schedule| !schedule.is_finished())
    }

    pub async fn active_target(&self) -> Option<String> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|schedule| schedule.target().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use sitewalk_scanner::{FetchOutcome, ScanError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRunner {
        runs: AtomicUsize,
    }

    impl CrawlRunner for CountingRunner {
        fn run<'a>(
            &'a self,
            target: &'a str,
            _max_concurrent: usize,
        ) -> BoxFuture<'a, Result<StatusMap>> {
            Box::pin(async move {
                self.runs.fetch_add(1, Ordering::SeqCst);
                let mut status = StatusMap::new();
                status.record(target, FetchOutcome::Status(200));
                status.record(&format!("{}missing", target), FetchOutcome::Status(404));
                Ok::<_, CoreError>(status)
            })
        }
    }

    struct FailingRunner;

    impl CrawlRunner for FailingRunner {
        fn run<'a>(&'a self, target: &'a str, _: usize) -> BoxFuture<'a, Result<StatusMap>> {
            Box::pin(async move {
                Err::<StatusMap, _>(CoreError::Scan(ScanError::InvalidUrl(target.to_string())))
            })
        }
    }

    struct StuckRunner;

    impl CrawlRunner for StuckRunner {
        fn run<'a>(&'a self, _: &'a str, _: usize) -> BoxFuture<'a, Result<StatusMap>> {
            Box::pin(futures::future::pending::<Result<StatusMap>>())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_crawls_immediately_then_every_interval() {
        let state = SharedAgentState::new();
        let runner = Arc::new(CountingRunner::default());
        let schedule = PeriodicCrawl::start(
            "https://a.test/",
            Duration::from_secs(60),
            4,
            state.clone(),
            runner.clone(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runner.runs.load(Ordering::SeqCst), 1);

        let snapshot = state.snapshot().await;
        let crawl = snapshot.last_crawl.unwrap();
        assert_eq!(crawl.http_200.len(), 1);
        assert_eq!(crawl.http_non200.len(), 1);
        assert_eq!(
            snapshot.suggestions.unwrap(),
            vec!["Check for broken link: https://a.test/missing"]
        );

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(runner.runs.load(Ordering::SeqCst), 3);

        schedule.stop().await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(runner.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_recorded_and_schedule_continues() {
        let state = SharedAgentState::new();
        let schedule = PeriodicCrawl::start(
            "not a url",
            Duration::from_secs(5),
            1,
            state.clone(),
            Arc::new(FailingRunner),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        let crawl = state.snapshot().await.last_crawl.unwrap();
        assert!(crawl.http_200.is_empty());
        assert!(crawl.http_non200.is_empty());
        assert!(crawl.error.unwrap().contains("not a url"));
        assert!(!schedule.is_finished());

        schedule.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_in_flight_crawl() {
        let state = SharedAgentState::new();
        let schedule = PeriodicCrawl::start(
            "https://a.test/",
            Duration::from_secs(5),
            1,
            state.clone(),
            Arc::new(StuckRunner),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        schedule.stop().await;
        assert!(state.snapshot().await.last_crawl.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_keeps_one_schedule() {
        let scheduler = Scheduler::new();
        let state = SharedAgentState::new();
        let first = Arc::new(CountingRunner::default());
        let second = Arc::new(CountingRunner::default());

        assert!(!scheduler.is_running().await);
        assert!(!scheduler.stop().await);

        scheduler
            .start("https://a.test/", Duration::from_secs(10), 2, state.clone(), first.clone())
            .await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(scheduler.is_running().await);

        scheduler
            .start("https://b.test/", Duration::from_secs(10), 2, state.clone(), second.clone())
            .await;
        assert_eq!(scheduler.active_target().await.as_deref(), Some("https://b.test/"));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(first.runs.load(Ordering::SeqCst), 1);
        assert_eq!(second.runs.load(Ordering::SeqCst), 3);

        assert!(scheduler.stop().await);
        assert!(!scheduler.is_running().await);
        assert!(scheduler.active_target().await.is_none());
    }
}
