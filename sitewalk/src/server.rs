// HTTP surface of the crawl agent

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use sitewalk_core::agent::SharedAgentState;
use sitewalk_core::config::{DEFAULT_TIMEOUT_SECS, OutputFormat, ServeConfig};
use sitewalk_core::crawl::{CrawlOptions, execute_crawl};
use sitewalk_core::relay::{self, Relay, RpcRequest};
use sitewalk_core::report::{split_by_status, write_report_blocking};
use sitewalk_core::schedule::{HttpCrawlRunner, Scheduler, SharedRunner};
use sitewalk_core::{CoreError, files};
use sitewalk_scanner::{ScanError, Scope};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const MESSAGE_SEND: &str = "message:send";

pub struct AppState {
    pub relay: Relay,
    pub config: ServeConfig,
}

impl AppState {
    /// Periodic crawls write their JSON reports into the results directory.
    pub fn new(config: ServeConfig) -> Self {
        let runner: SharedRunner = Arc::new(
            HttpCrawlRunner::new()
                .with_results_dir(config.results_dir.clone())
                .with_prefix(&config.report_prefix),
        );
        Self::with_runner(config, runner)
    }

    pub fn with_runner(config: ServeConfig, runner: SharedRunner) -> Self {
        let relay = Relay::new(SharedAgentState::new(), Arc::new(Scheduler::new()), runner)
            .with_defaults(config.default_interval_secs, config.default_max_concurrent);
        Self { relay, config }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.config.bind)
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/.well-known/agent-card.json", get(agent_card_handler))
        // A `:` inside a segment would start a parameter, so the RPC method
        // is matched in the handler.
        .route("/v1/:method", post(message_send_handler))
        .route("/describe", get(describe_handler))
        .route("/invoke", post(invoke_handler))
        .route("/files/*path", get(file_handler))
        .route("/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.results_dir)?;
    let bind = config.bind;
    let app = create_app(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Agent listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn agent_card_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(relay::agent_card(&state.base_url()))
}

async fn message_send_handler(
    State(state): State<Arc<AppState>>,
    Path(method): Path<String>,
    Json(request): Json<RpcRequest>,
) -> Response {
    if method != MESSAGE_SEND {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(state.relay.handle(request).await).into_response()
}

async fn describe_handler() -> impl IntoResponse {
    Json(relay::tool_description())
}

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub target_url: String,
    pub max_concurrent: Option<usize>,
    pub output_format: Option<String>,
    pub output_prefix: Option<String>,
}

async fn invoke_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InvokeRequest>,
) -> Result<Json<Value>, ApiError> {
    let (seed, _) = Scope::from_seed(&body.target_url).map_err(ApiError::from_scan)?;

    let format = match body.output_format.as_deref() {
        None => OutputFormat::Json,
        Some(name) => OutputFormat::parse(name).ok_or_else(|| {
            ApiError::bad_request(format!("Unknown output format: {}", name))
        })?,
    };

    let prefix = body
        .output_prefix
        .unwrap_or_else(|| state.config.report_prefix.clone());
    if prefix.is_empty() || prefix.contains(['/', '\\']) || prefix.contains("..") {
        return Err(ApiError::bad_request(format!(
            "Invalid output prefix: {}",
            prefix
        )));
    }

    let options = CrawlOptions {
        url: seed,
        max_concurrent: body
            .max_concurrent
            .unwrap_or(state.config.default_max_concurrent),
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        show_progress_bars: false,
    };
    let output = execute_crawl(options, None).await?;

    let (ok, failing) = split_by_status(&output.status);
    write_report_blocking(
        ok.clone(),
        failing.clone(),
        format,
        state.config.results_dir.join(&prefix),
    )
    .await?;

    Ok(Json(json!({
        "http_200": ok,
        "http_non200": failing,
        "links": output.graph.to_adjacency(),
    })))
}

async fn file_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let resolved = files::resolve_result_file(&state.config.results_dir, &path)?;
    let content_type = match resolved.extension().and_then(|ext| ext.to_str()) {
        Some("json") => "application/json",
        Some("csv") => "text/csv; charset=utf-8",
        _ => "text/markdown; charset=utf-8",
    };
    let bytes = tokio::fs::read(&resolved).await.map_err(CoreError::from)?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.relay.state().snapshot().await;
    let scheduler = state.relay.scheduler();
    Json(json!({
        "agent": snapshot,
        "running": scheduler.is_running().await,
        "active_target": scheduler.active_target().await,
        "files": files::list_result_files(&state.config.results_dir),
    }))
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn from_scan(err: ScanError) -> Self {
        Self::from(CoreError::from(err))
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::PathTraversal(_) | CoreError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            CoreError::Scan(ScanError::InvalidUrl(_) | ScanError::MissingHost(_)) => {
                StatusCode::BAD_REQUEST
            }
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
