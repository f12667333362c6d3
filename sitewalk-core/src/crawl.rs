use crate::config::CrawlConfig;
use crate::error::Result;
use crate::report::{self, ReportPaths, split_by_status};
use crate::sitemap;
use indicatif::{ProgressBar, ProgressStyle};
use sitewalk_scanner::{CrawlOutput, Crawler, RoundProgress};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn from_config(config: &CrawlConfig, url: &str, show_progress_bars: bool) -> Self {
        Self {
            url: url.to_string(),
            max_concurrent: config.max_concurrent,
            timeout_secs: config.timeout_secs,
            show_progress_bars,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Files produced from one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutputs {
    pub reports: ReportPaths,
    pub status_table: Option<PathBuf>,
    pub sitemap: Option<PathBuf>,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options
/// Returns the status map and link graph once the crawl settles
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutput> {
    let CrawlOptions {
        url,
        max_concurrent,
        timeout_secs,
        show_progress_bars,
    } = options;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let dispatched = Arc::new(AtomicUsize::new(0));

    let pb_dispatch = progress_bar.clone();
    let count_clone = dispatched.clone();
    let dispatch_callback = Arc::new(move |round: usize, url: String| {
        let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref pb) = pb_dispatch {
            pb.set_message(format!(
                "Round {} - {} URLs dispatched - {}",
                round,
                count,
                extract_url_path(&url)
            ));
            pb.tick();
        }
    });

    let pb_round = progress_bar.clone();
    let round_callback = Arc::new(move |progress: RoundProgress| {
        let msg = format!(
            "Progress: {} visited, {} queued.",
            progress.visited, progress.queued
        );
        if let Some(ref pb) = pb_round {
            pb.set_message(msg.clone());
        }
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    });

    let crawler = Crawler::with_timeout(timeout_secs)?
        .with_progress_callback(dispatch_callback)
        .with_round_callback(round_callback);

    let output = crawler.crawl(&url, max_concurrent).await;

    // Finish progress bar (only if enabled)
    if let Some(ref pb) = progress_bar {
        let total = dispatched.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} pages visited", total));
    }

    Ok(output?)
}

/// Writes the status reports in the configured format. The Markdown status
/// table and sitemap are written when requested.
pub fn write_outputs(
    output: &CrawlOutput,
    config: &CrawlConfig,
    include_status_table: bool,
    include_sitemap: bool,
) -> Result<WrittenOutputs> {
    let (ok, failing) = split_by_status(&output.status);
    let reports = report::write_report(
        &ok,
        &failing,
        config.output_format,
        Path::new(&config.output_prefix),
    )?;

    let status_table = if include_status_table {
        let table = report::markdown_status_table(&output.status);
        report::save_report(&table, &config.status_report)?;
        Some(config.status_report.clone())
    } else {
        None
    };

    let sitemap = if include_sitemap {
        let md = sitemap::render_markdown(&output.graph, &output.seed);
        report::save_report(&md, &config.sitemap_report)?;
        Some(config.sitemap_report.clone())
    } else {
        None
    };

    Ok(WrittenOutputs {
        reports,
        status_table,
        sitemap,
    })
}

/// Generate a terminal crawl report from results
pub fn generate_crawl_report(output: &CrawlOutput) -> String {
    let summary = report::summarize(&output.status);

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Seed: {}\n", output.seed));
    report.push_str(&format!("  Pages crawled: {}\n", summary.total));
    report.push_str(&format!("  Rounds: {}\n", output.rounds));
    report.push_str(&format!("  Links found: {}\n", output.graph.edge_count()));
    report.push_str(&format!("  HTTP 200: {}\n", summary.ok));
    report.push_str(&format!("  Redirects: {}\n", summary.redirects));
    report.push_str(&format!(
        "  Failing: {} ({} transport errors)\n",
        summary.failing, summary.errors
    ));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group non-200 results by status so broken pages stand out
    let mut by_status: BTreeMap<String, (Option<u16>, Vec<&str>)> = BTreeMap::new();
    for (url, outcome) in output.status.iter() {
        if !outcome.is_ok() {
            by_status
                .entry(outcome.to_string())
                .or_insert_with(|| (outcome.status_code(), Vec::new()))
                .1
                .push(url);
        }
    }

    if by_status.is_empty() {
        report.push_str("All pages answered 200.\n");
        return report;
    }

    for (code, urls) in by_status.values() {
        // Color code based on status
        let status_str = match *code {
            Some(code @ 100..=199) => format!("\x1b[37m{}\x1b[0m", code), // White
            Some(code @ 200..=299) => format!("\x1b[32m{}\x1b[0m", code), // Green
            Some(code @ 300..=399) => format!("\x1b[36m{}\x1b[0m", code), // Cyan
            Some(code @ 400..=499) => format!("\x1b[33m{}\x1b[0m", code), // Orange/Yellow
            Some(code @ 500..=599) => format!("\x1b[31m{}\x1b[0m", code), // Red
            Some(code) => format!("{}", code),
            None => format!("\x1b[31m{}\x1b[0m", "ERR"),
        };

        report.push_str(&format!("## {} ({} pages)\n", status_str, urls.len()));
        for url in urls {
            report.push_str(&format!("  {}\n", extract_url_path(url)));
        }
        report.push('\n');
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewalk_scanner::{FetchOutcome, LinkGraph, StatusMap};

    fn output() -> CrawlOutput {
        let status: StatusMap = [
            ("https://a.test/".to_string(), FetchOutcome::Status(200)),
            ("https://a.test/old".to_string(), FetchOutcome::Status(301)),
            ("https://a.test/missing".to_string(), FetchOutcome::Status(404)),
        ]
        .into_iter()
        .collect();
        let mut graph = LinkGraph::new();
        graph.add_edge("https://a.test/", "https://a.test/old");
        graph.add_edge("https://a.test/", "https://a.test/missing");

        CrawlOutput {
            seed: "https://a.test/".to_string(),
            status,
            graph,
            rounds: 2,
        }
    }

    #[test]
    fn test_report_lists_non_200_pages() {
        let report = generate_crawl_report(&output());
        assert!(report.contains("Pages crawled: 3"));
        assert!(report.contains("Links found: 2"));
        assert!(report.contains("/missing"));
        assert!(report.contains("/old"));
    }

    #[test]
    fn test_report_groups_by_outcome() {
        let mut out = output();
        out.status.record("https://a.test/down", FetchOutcome::Status(503));
        out.status
            .record("https://a.test/slow", FetchOutcome::Error("timeout".to_string()));
        out.status
            .record("https://a.test/slower", FetchOutcome::Error("timeout".to_string()));

        let report = generate_crawl_report(&out);
        assert!(report.contains("## \x1b[33m404\x1b[0m (1 pages)"));
        assert!(report.contains("## \x1b[36m301\x1b[0m (1 pages)"));
        assert!(report.contains("## \x1b[31m503\x1b[0m (1 pages)"));
        assert!(report.contains("## \x1b[31mERR\x1b[0m (2 pages)"));
    }

    #[test]
    fn test_report_all_ok() {
        let mut out = output();
        out.status = [("https://a.test/".to_string(), FetchOutcome::Status(200))]
            .into_iter()
            .collect();
        assert!(generate_crawl_report(&out).contains("All pages answered 200."));
    }
}
