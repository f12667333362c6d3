use crate::error::Result;
use crate::extract::{Scope, extract_links};
use crate::result::FetchOutcome;
use reqwest::Client;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// What a single fetch produced: the URL, its outcome and the in-scope links
/// found on it. Only pages answering exactly 200 carry links.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub url: String,
    pub outcome: FetchOutcome,
    pub links: HashSet<String>,
}

impl PageReport {
    pub fn new(url: &str, outcome: FetchOutcome, links: HashSet<String>) -> Self {
        Self {
            url: url.to_string(),
            outcome,
            links,
        }
    }

    pub fn status_only(url: &str, status: u16) -> Self {
        Self::new(url, FetchOutcome::Status(status), HashSet::new())
    }

    pub fn failed(url: &str, cause: String) -> Self {
        Self::new(url, FetchOutcome::Error(cause), HashSet::new())
    }
}

/// Performs one page fetch. Implementations never touch crawl state; the
/// coordinator applies the returned report.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str, scope: &Scope) -> impl Future<Output = PageReport> + Send;
}

/// `reqwest`-backed fetcher with a fixed per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Sitewalk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, scope: &Scope) -> PageReport {
        debug!("Fetching {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return PageReport::failed(url, describe_error(&e)),
        };

        let status = response.status().as_u16();
        debug!("Fetched {} - HTTP {}", url, status);
        if status != 200 {
            return PageReport::status_only(url, status);
        }

        match response.text().await {
            Ok(body) => {
                let links = extract_links(&body, url, scope);
                PageReport::new(url, FetchOutcome::Status(status), links)
            }
            Err(e) => PageReport::failed(url, describe_error(&e)),
        }
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_body() || error.is_decode() {
        "unreadable body"
    } else {
        "request failed"
    };
    format!("{}: {}", kind, error)
}
