// Defaults for crawl runs and the agent service, plus override merging.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_MAX_CONCURRENT: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_OUTPUT_PREFIX: &str = "crawler_report";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_STATUS_REPORT: &str = "crawler_report.md";
pub const DEFAULT_SITEMAP_REPORT: &str = "sitemap_report.md";
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_REPORT_PREFIX: &str = "a2a_mcp";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub target_url: Option<String>,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    pub output_format: OutputFormat,
    pub output_prefix: String,
    pub status_report: PathBuf,
    pub sitemap_report: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target_url: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_format: OutputFormat::default(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            status_report: PathBuf::from(DEFAULT_STATUS_REPORT),
            sitemap_report: PathBuf::from(DEFAULT_SITEMAP_REPORT),
        }
    }
}

/// Values supplied by the caller; `None` keeps the default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub target_url: Option<String>,
    pub max_concurrent: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub output_format: Option<OutputFormat>,
    pub output_prefix: Option<String>,
    pub status_report: Option<PathBuf>,
    pub sitemap_report: Option<PathBuf>,
}

impl CrawlConfig {
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(target_url) = overrides.target_url {
            self.target_url = Some(target_url);
        }
        if let Some(max_concurrent) = overrides.max_concurrent {
            self.max_concurrent = max_concurrent;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(output_format) = overrides.output_format {
            self.output_format = output_format;
        }
        if let Some(output_prefix) = overrides.output_prefix {
            self.output_prefix = output_prefix;
        }
        if let Some(status_report) = overrides.status_report {
            self.status_report = status_report;
        }
        if let Some(sitemap_report) = overrides.sitemap_report {
            self.sitemap_report = sitemap_report;
        }
        self
    }
}

/// Settings for the long-running agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub results_dir: PathBuf,
    pub default_interval_secs: u64,
    pub default_max_concurrent: usize,
    pub report_prefix: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            default_interval_secs: DEFAULT_INTERVAL_SECS,
            default_max_concurrent: DEFAULT_MAX_CONCURRENT,
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert_eq!(config.output_prefix, "crawler_report");
        assert_eq!(config.target_url, None);
    }

    #[test]
    fn test_merge_prefers_explicit_values() {
        let config = CrawlConfig::default().merge(ConfigOverrides {
            target_url: Some("https://example.com/".to_string()),
            max_concurrent: Some(3),
            output_format: Some(OutputFormat::Json),
            ..Default::default()
        });

        assert_eq!(config.target_url.as_deref(), Some("https://example.com/"));
        assert_eq!(config.max_concurrent, 3);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.output_prefix, DEFAULT_OUTPUT_PREFIX);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::parse("CSV"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("Markdown"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("xml"), None);
        assert_eq!(OutputFormat::Json.extension(), "json");
    }

    #[test]
    fn test_serve_defaults() {
        let config = ServeConfig::default();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.default_interval_secs, 3600);
        assert_eq!(config.results_dir, PathBuf::from("results"));
    }
}
