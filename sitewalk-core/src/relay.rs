// JSON-RPC skill relay for the crawl agent

use crate::agent::SharedAgentState;
use crate::config::{DEFAULT_INTERVAL_SECS, DEFAULT_MAX_CONCURRENT};
use crate::error::{CoreError, Result};
use crate::schedule::{Scheduler, SharedRunner};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sitewalk_scanner::Scope;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const SERVER_ERROR: i64 = -32000;
pub const PROTOCOL_VERSION: &str = "0.3.0";

pub const START_PERIODIC_CRAWL: &str = "start_periodic_crawl";
pub const STOP_PERIODIC_CRAWL: &str = "stop_periodic_crawl";
pub const GET_LAST_REPORT: &str = "get_last_report";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Value,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: Value,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    fn from_result(request: &RpcRequest, result: Result<Value>) -> Self {
        let (result, error) = match result {
            Ok(value) => (Some(value), None),
            Err(e) => (
                None,
                Some(RpcError {
                    code: SERVER_ERROR,
                    message: e.to_string(),
                }),
            ),
        };
        Self {
            jsonrpc: request.jsonrpc.clone(),
            id: request.id.clone(),
            result,
            error,
        }
    }
}

/// Dispatches skill requests against the agent state and the scheduler.
pub struct Relay {
    state: SharedAgentState,
    scheduler: Arc<Scheduler>,
    runner: SharedRunner,
    default_interval_secs: u64,
    default_max_concurrent: usize,
}

impl Relay {
    pub fn new(state: SharedAgentState, scheduler: Arc<Scheduler>, runner: SharedRunner) -> Self {
        Self {
            state,
            scheduler,
            runner,
            default_interval_secs: DEFAULT_INTERVAL_SECS,
            default_max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_defaults(mut self, interval_secs: u64, max_concurrent: usize) -> Self {
        self.default_interval_secs = interval_secs;
        self.default_max_concurrent = max_concurrent;
        self
    }

    pub fn state(&self) -> &SharedAgentState {
        &self.state
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        let result = self.dispatch(&request.params).await;
        if let Err(ref e) = result {
            debug!("Skill request failed: {}", e);
        }
        RpcResponse::from_result(&request, result)
    }

    async fn dispatch(&self, params: &Map<String, Value>) -> Result<Value> {
        let skill = params.get("skill").and_then(Value::as_str);
        match skill {
            Some(START_PERIODIC_CRAWL) => self.start_periodic_crawl(params).await,
            Some(STOP_PERIODIC_CRAWL) => {
                let stopped = self.scheduler.stop().await;
                Ok(json!({ "stopped": stopped }))
            }
            Some(GET_LAST_REPORT) => {
                let snapshot = self.state.snapshot().await;
                Ok(json!({
                    "timestamp": snapshot.last_timestamp,
                    "last_crawl": snapshot.last_crawl,
                    "suggestions": snapshot.suggestions,
                }))
            }
            Some(other) => Err(CoreError::UnknownSkill(other.to_string())),
            None => Err(CoreError::UnknownSkill(
                params.get("skill").map_or("null".to_string(), Value::to_string),
            )),
        }
    }

    async fn start_periodic_crawl(&self, params: &Map<String, Value>) -> Result<Value> {
        let target = params
            .get("target_url")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::InvalidParams("target_url is required".to_string()))?;
        let interval = param_u64(params, "interval_seconds", self.default_interval_secs)?;
        let max_concurrent = param_u64(
            params,
            "max_concurrent",
            self.default_max_concurrent as u64,
        )?;
        let max_concurrent = usize::try_from(max_concurrent).map_err(|_| {
            CoreError::InvalidParams(format!("max_concurrent {} is too large", max_concurrent))
        })?;

        if interval == 0 {
            return Err(CoreError::InvalidParams(
                "interval_seconds must be at least 1".to_string(),
            ));
        }
        if max_concurrent == 0 {
            return Err(CoreError::InvalidParams(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        let (seed, _) = Scope::from_seed(target)?;

        self.state
            .record_schedule(target, interval, max_concurrent)
            .await;
        self.scheduler
            .start(
                &seed,
                Duration::from_secs(interval),
                max_concurrent,
                self.state.clone(),
                self.runner.clone(),
            )
            .await;

        info!("Periodic crawl started for {}", target);
        Ok(json!({ "message": format!("Periodic crawl started for {}", target) }))
    }
}

/// Reads a non-negative integer parameter given as a JSON number or a numeric
/// string.
fn param_u64(params: &Map<String, Value>, key: &str, default: u64) -> Result<u64> {
    let invalid = || CoreError::InvalidParams(format!("{} must be a non-negative integer", key));
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Describes the agent and its skills.
pub fn agent_card(base_url: &str) -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "name": "Sitewalk Crawler Agent",
        "description": "Agent for periodic site crawling and health suggestions.",
        "url": format!("{}/v1", base_url.trim_end_matches('/')),
        "preferredTransport": "HTTP+JSON",
        "version": env!("CARGO_PKG_VERSION"),
        "capabilities": { "streaming": false, "pushNotifications": false },
        "defaultInputModes": ["application/json"],
        "defaultOutputModes": ["application/json"],
        "skills": [
            {
                "id": START_PERIODIC_CRAWL,
                "name": "Start Periodic Crawl",
                "description": "Schedule periodic crawling",
                "tags": ["crawler", "monitoring"],
                "examples": ["Start crawling every hour for https://example.com"],
            },
            {
                "id": STOP_PERIODIC_CRAWL,
                "name": "Stop Periodic Crawl",
                "description": "Stop the active crawl schedule",
                "tags": ["crawler", "monitoring"],
                "examples": ["Stop crawling"],
            },
            {
                "id": GET_LAST_REPORT,
                "name": "Get Crawl Report",
                "description": "Fetch the latest crawl and suggestions",
                "tags": ["crawler", "report"],
                "examples": ["Show me the last crawl summary"],
            },
        ],
    })
}

/// Parameters and outputs of the one-shot crawl tool.
pub fn tool_description() -> Value {
    json!({
        "name": "sitewalk_crawl",
        "description": "Crawls a website and returns HTTP 200/non-200 results (excludes redirects)",
        "parameters": {
            "target_url": { "type": "string", "description": "Base URL to crawl" },
            "max_concurrent": { "type": "integer", "description": "Maximum concurrent requests" },
            "output_format": { "type": "string", "enum": ["csv", "json", "markdown"], "description": "Report format" },
            "output_prefix": { "type": "string", "description": "Prefix for output files inside the results directory" },
        },
        "outputs": {
            "http_200": { "type": "list", "description": "List of HTTP 200 records" },
            "http_non200": { "type": "list", "description": "List of HTTP non-200 (not 3xx) records" },
            "links": { "type": "object", "description": "Links found on each crawled page, keyed by page URL" },
        },
    })
}
