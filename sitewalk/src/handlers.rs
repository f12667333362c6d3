use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use sitewalk_core::CoreError;
use sitewalk_core::config::{ConfigOverrides, CrawlConfig, OutputFormat, ServeConfig};
use sitewalk_scanner::ScanError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

// Re-export crawl types and functions from sitewalk-core
pub use sitewalk_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, generate_crawl_report,
    write_outputs,
};

pub const EXIT_CRAWL_FAILED: i32 = 1;
pub const EXIT_OUTPUT_FAILED: i32 = 2;

/// Process exit code for a failed command: 1 when the crawl could not start,
/// 2 for report or I/O failures.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let seed_problem = err.chain().any(|cause| {
        cause.downcast_ref::<ScanError>().is_some()
            || matches!(cause.downcast_ref::<CoreError>(), Some(CoreError::Scan(_)))
    });
    if seed_problem {
        EXIT_CRAWL_FAILED
    } else {
        EXIT_OUTPUT_FAILED
    }
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Collect the crawl options the user actually gave
pub fn crawl_overrides(sub_matches: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        target_url: sub_matches.get_one::<String>("url").cloned(),
        max_concurrent: sub_matches.get_one::<usize>("threads").copied(),
        timeout_secs: sub_matches.get_one::<u64>("timeout").copied(),
        output_format: sub_matches
            .get_one::<String>("format")
            .and_then(|f| OutputFormat::parse(f)),
        output_prefix: sub_matches
            .get_one::<String>("output")
            .map(|p| expand_path(p).display().to_string()),
        ..Default::default()
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = CrawlConfig::default().merge(crawl_overrides(sub_matches));
    let url = config.target_url.clone().unwrap_or_default();
    let include_sitemap = sub_matches.get_flag("sitemap");
    let include_status_table = sub_matches.get_flag("markdown");

    if !quiet {
        print_divider();
        println!("{} {}", "Crawling".bright_cyan().bold(), url);
        println!("Max concurrent: {}", config.max_concurrent);
        println!("Timeout: {}s", config.timeout_secs);
        print_divider();
    }

    let options = CrawlOptions::from_config(&config, &url, !quiet);
    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| tracing::debug!("{}", msg)))
    };

    let output = execute_crawl(options, progress_callback)
        .await
        .with_context(|| format!("Crawl of '{}' failed", url))?;

    let written = write_outputs(&output, &config, include_status_table, include_sitemap)
        .context("Failed to write crawl reports")?;

    println!("{}", generate_crawl_report(&output));
    println!("{} {}", "✓ HTTP 200 report:".green(), written.reports.ok.display());
    println!(
        "{} {}",
        "✓ HTTP non-200 report:".green(),
        written.reports.failing.display()
    );
    if let Some(path) = written.status_table {
        println!("{} {}", "✓ Status table:".green(), path.display());
    }
    if let Some(path) = written.sitemap {
        println!("{} {}", "✓ Sitemap:".green(), path.display());
    }

    Ok(())
}

pub async fn handle_serve(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let defaults = ServeConfig::default();
    let config = ServeConfig {
        bind: sub_matches
            .get_one::<SocketAddr>("bind")
            .copied()
            .unwrap_or(defaults.bind),
        results_dir: sub_matches
            .get_one::<PathBuf>("results-dir")
            .map(|p| expand_path(&p.to_string_lossy()))
            .unwrap_or(defaults.results_dir),
        default_interval_secs: sub_matches
            .get_one::<u64>("interval")
            .copied()
            .unwrap_or(defaults.default_interval_secs),
        default_max_concurrent: sub_matches
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or(defaults.default_max_concurrent),
        report_prefix: defaults.report_prefix,
    };

    if !quiet {
        println!(
            "{} http://{}",
            "Agent listening on".bright_cyan().bold(),
            config.bind
        );
        println!("Results directory: {}", config.results_dir.display());
    }

    crate::server::serve(config)
        .await
        .context("Agent service stopped")
}
