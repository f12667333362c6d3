// State shared between the periodic crawl task and the skill relay.

use crate::report::{StatusRecord, split_by_status};
use serde::{Deserialize, Serialize};
use sitewalk_scanner::{FetchOutcome, StatusMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecords {
    pub http_200: Vec<StatusRecord>,
    pub http_non200: Vec<StatusRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlRecords {
    pub fn from_status(status: &StatusMap) -> Self {
        let (http_200, http_non200) = split_by_status(status);
        Self {
            http_200,
            http_non200,
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub last_target: Option<String>,
    pub last_interval: Option<u64>,
    pub last_max_concurrent: Option<usize>,
    pub last_crawl: Option<CrawlRecords>,
    pub last_timestamp: Option<String>,
    pub suggestions: Option<Vec<String>>,
}

/// Handle to the agent state. Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct SharedAgentState {
    inner: Arc<RwLock<AgentState>>,
}

impl SharedAgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> AgentState {
        self.inner.read().await.clone()
    }

    pub async fn record_schedule(&self, target: &str, interval_secs: u64, max_concurrent: usize) {
        let mut state = self.inner.write().await;
        state.last_target = Some(target.to_string());
        state.last_interval = Some(interval_secs);
        state.last_max_concurrent = Some(max_concurrent);
    }

    /// Replaces the crawl result, its timestamp and the suggestions together.
    pub async fn record_crawl(&self, records: CrawlRecords) {
        let suggestions = generate_suggestions(&records.http_non200);
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut state = self.inner.write().await;
        state.last_crawl = Some(records);
        state.last_timestamp = Some(timestamp);
        state.suggestions = Some(suggestions);
    }
}

pub fn generate_suggestions(failing: &[StatusRecord]) -> Vec<String> {
    failing
        .iter()
        .map(|record| match record.status {
            FetchOutcome::Status(404) => format!("Check for broken link: {}", record.uri),
            FetchOutcome::Status(500) => format!("Investigate server error: {}", record.uri),
            ref other => format!("Review non-200 status {}: {}", other, record.uri),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uri: &str, status: FetchOutcome) -> StatusRecord {
        StatusRecord {
            uri: uri.to_string(),
            status,
        }
    }

    #[test]
    fn test_suggestions_by_status() {
        let failing = vec![
            record("https://a.test/missing", FetchOutcome::Status(404)),
            record("https://a.test/boom", FetchOutcome::Status(500)),
            record("https://a.test/teapot", FetchOutcome::Status(418)),
            record("https://a.test/down", FetchOutcome::Error("timed out".to_string())),
        ];

        assert_eq!(
            generate_suggestions(&failing),
            vec![
                "Check for broken link: https://a.test/missing",
                "Investigate server error: https://a.test/boom",
                "Review non-200 status 418: https://a.test/teapot",
                "Review non-200 status Error: timed out: https://a.test/down",
            ]
        );
    }

    #[tokio::test]
    async fn test_record_crawl_updates_together() {
        let state = SharedAgentState::new();
        assert_eq!(state.snapshot().await, AgentState::default());

        let status: StatusMap = [
            ("https://a.test/".to_string(), FetchOutcome::Status(200)),
            ("https://a.test/x".to_string(), FetchOutcome::Status(404)),
        ]
        .into_iter()
        .collect();
        state.record_crawl(CrawlRecords::from_status(&status)).await;

        let snapshot = state.snapshot().await;
        let crawl = snapshot.last_crawl.unwrap();
        assert_eq!(crawl.http_200.len(), 1);
        assert_eq!(crawl.http_non200.len(), 1);
        assert!(snapshot.last_timestamp.is_some());
        assert_eq!(
            snapshot.suggestions.unwrap(),
            vec!["Check for broken link: https://a.test/x"]
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let state = SharedAgentState::new();
        let other = state.clone();
        other.record_schedule("https://a.test/", 30, 4).await;

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.last_target.as_deref(), Some("https://a.test/"));
        assert_eq!(snapshot.last_interval, Some(30));
        assert_eq!(snapshot.last_max_concurrent, Some(4));
    }
}
