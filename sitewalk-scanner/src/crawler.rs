use crate::error::Result;
use crate::extract::Scope;
use crate::fetch::{HttpFetcher, PageFetcher, PageReport};
use crate::result::{CrawlOutput, FetchOutcome, LinkGraph, StatusMap};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Called with `(round, url)` whenever a URL is dispatched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Called after every round barrier.
pub type RoundCallback = Arc<dyn Fn(RoundProgress) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundProgress {
    pub round: usize,
    pub visited: usize,
    pub queued: usize,
}

/// Round-based crawl coordinator.
///
/// Each round takes the whole frontier as a batch, claims every URL in it as
/// visited, fetches the batch concurrently under a shared limit and waits for
/// all of it before building the next frontier. Frontier, visited set, status
/// map and graph are only touched between rounds, so none of them are locked.
pub struct Crawler<F = HttpFetcher> {
    fetcher: F,
    progress_callback: Option<ProgressCallback>,
    round_callback: Option<RoundCallback>,
}

impl Crawler<HttpFetcher> {
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new()?))
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(timeout_secs))?;
        Ok(Self::with_fetcher(fetcher))
    }
}

impl<F: PageFetcher> Crawler<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            progress_callback: None,
            round_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_round_callback(mut self, callback: RoundCallback) -> Self {
        self.round_callback = Some(callback);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Crawls every same-location page reachable from `seed`, with at most
    /// `max_concurrent` fetches in flight. Fails only when the seed itself is
    /// unusable; per-page failures end up in the status map.
    pub async fn crawl(&self, seed: &str, max_concurrent: usize) -> Result<CrawlOutput> {
        let (seed, scope) = Scope::from_seed(seed)?;

        let max_concurrent = effective_concurrency(max_concurrent);
        info!(
            "Starting crawl of {} with {} concurrent fetches",
            seed, max_concurrent
        );

        let limiter = Semaphore::new(max_concurrent);
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: HashSet<String> = HashSet::from([seed.clone()]);
        let mut status = StatusMap::new();
        let mut graph = LinkGraph::new();
        let mut rounds = 0;

        while !frontier.is_empty() {
            rounds += 1;

            // Claim the whole batch before the first fetch starts.
            let batch: Vec<String> = frontier
                .drain()
                .filter(|url| visited.insert(url.clone()))
                .collect();
            debug!("Round {} dispatching {} URLs", rounds, batch.len());

            if let Some(ref callback) = self.progress_callback {
                for url in &batch {
                    callback(rounds, url.clone());
                }
            }

            let fetches = batch
                .iter()
                .map(|url| self.fetch_limited(&limiter, url, &scope));
            let reports = join_all(fetches).await;

            for report in reports {
                apply_report(report, &visited, &mut frontier, &mut status, &mut graph);
            }

            info!(
                "Progress: {} visited, {} queued",
                visited.len(),
                frontier.len()
            );
            if let Some(ref callback) = self.round_callback {
                callback(RoundProgress {
                    round: rounds,
                    visited: visited.len(),
                    queued: frontier.len(),
                });
            }
        }

        info!("Crawl complete. {} pages visited", visited.len());
        Ok(CrawlOutput {
            seed,
            status,
            graph,
            rounds,
        })
    }

    async fn fetch_limited(&self, limiter: &Semaphore, url: &str, scope: &Scope) -> PageReport {
        let _permit = match limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => return PageReport::failed(url, format!("fetch limiter closed: {}", e)),
        };
        self.fetcher.fetch(url, scope).await
    }
}

/// Clamps a requested limit into what the fetch limiter can hold.
fn effective_concurrency(requested: usize) -> usize {
    if requested == 0 {
        warn!("max_concurrent of 0 requested, using 1");
        1
    } else if requested > Semaphore::MAX_PERMITS {
        warn!(
            "max_concurrent of {} requested, using {}",
            requested,
            Semaphore::MAX_PERMITS
        );
        Semaphore::MAX_PERMITS
    } else {
        requested
    }
}

/// Folds one finished fetch into the crawl state. Links to pages that are not
/// yet claimed join the next frontier; edges are kept for every link.
fn apply_report(
    report: PageReport,
    visited: &HashSet<String>,
    frontier: &mut HashSet<String>,
    status: &mut StatusMap,
    graph: &mut LinkGraph,
) {
    match report.outcome {
        FetchOutcome::Error(ref cause) => warn!("Crawl error for {}: {}", report.url, cause),
        FetchOutcome::Status(code) if code != 200 => {
            debug!("Skipped links of {}, status {}", report.url, code)
        }
        FetchOutcome::Status(_) => {}
    }

    graph.add_node(&report.url);
    for link in &report.links {
        graph.add_edge(&report.url, link);
        if !visited.contains(link) {
            frontier.insert(link.clone());
        }
    }
    status.record(&report.url, report.outcome);
}
