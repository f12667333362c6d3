// Tests for status report generation

use sitewalk_core::config::OutputFormat;
use sitewalk_core::report::{
    markdown_status_table, split_by_status, summarize, write_report, write_report_blocking,
};
use sitewalk_scanner::{FetchOutcome, StatusMap};
use tempfile::TempDir;

fn status_map() -> StatusMap {
    [
        ("https://a.test/".to_string(), FetchOutcome::Status(200)),
        ("https://a.test/b".to_string(), FetchOutcome::Status(200)),
        ("https://a.test/old".to_string(), FetchOutcome::Status(302)),
        ("https://a.test/x".to_string(), FetchOutcome::Status(404)),
        (
            "https://a.test/slow".to_string(),
            FetchOutcome::Error("timed out".to_string()),
        ),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// Output Format Tests
// ============================================================================

#[test]
fn test_output_format_parse() {
    assert_eq!(OutputFormat::parse("csv"), Some(OutputFormat::Csv));
    assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
    assert_eq!(OutputFormat::parse("md"), Some(OutputFormat::Markdown));
    assert_eq!(OutputFormat::parse("xml"), None);
}

// ============================================================================
// Grouping Tests
// ============================================================================

#[test]
fn test_redirects_excluded_from_both_groups() {
    let (ok, failing) = split_by_status(&status_map());
    assert_eq!(ok.len(), 2);
    assert_eq!(failing.len(), 2);
    assert!(ok.iter().chain(failing.iter()).all(|r| r.uri != "https://a.test/old"));
}

#[test]
fn test_summary_counts() {
    let summary = summarize(&status_map());
    assert_eq!(summary.total, 5);
    assert_eq!(summary.ok, 2);
    assert_eq!(summary.redirects, 1);
    assert_eq!(summary.failing, 2);
    assert_eq!(summary.errors, 1);
}

// ============================================================================
// File Output Tests
// ============================================================================

#[test]
fn test_write_csv_report() {
    let dir = TempDir::new().unwrap();
    let (ok, failing) = split_by_status(&status_map());
    let paths = write_report(&ok, &failing, OutputFormat::Csv, &dir.path().join("r")).unwrap();

    assert_eq!(paths.ok, dir.path().join("r_http200.csv"));
    assert_eq!(
        std::fs::read_to_string(&paths.ok).unwrap(),
        "uri,status\nhttps://a.test/,200\nhttps://a.test/b,200\n"
    );
    assert_eq!(
        std::fs::read_to_string(&paths.failing).unwrap(),
        "uri,status\nhttps://a.test/slow,Error: timed out\nhttps://a.test/x,404\n"
    );
}

#[test]
fn test_write_json_report_status_types() {
    let dir = TempDir::new().unwrap();
    let (ok, failing) = split_by_status(&status_map());
    let paths = write_report(&ok, &failing, OutputFormat::Json, &dir.path().join("r")).unwrap();

    let failing: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.failing).unwrap()).unwrap();
    assert_eq!(
        failing,
        serde_json::json!([
            { "uri": "https://a.test/slow", "status": "Error: timed out" },
            { "uri": "https://a.test/x", "status": 404 },
        ])
    );
}

#[test]
fn test_write_report_creates_directory() {
    let dir = TempDir::new().unwrap();
    let prefix = dir.path().join("results").join("nightly");
    let paths = write_report(&[], &[], OutputFormat::Markdown, &prefix).unwrap();

    assert!(paths.ok.exists());
    assert_eq!(paths.failing, dir.path().join("results").join("nightly_http_non200.md"));
}

#[tokio::test]
async fn test_write_report_from_async_context() {
    let dir = TempDir::new().unwrap();
    let (ok, failing) = split_by_status(&status_map());
    let paths = write_report_blocking(ok, failing, OutputFormat::Json, dir.path().join("run"))
        .await
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.failing).unwrap()).unwrap();
    assert_eq!(written[1]["uri"], "https://a.test/x");
    assert_eq!(paths.ok, dir.path().join("run_http200.json"));
}

// ============================================================================
// Markdown Table Tests
// ============================================================================

#[test]
fn test_markdown_table_pads_shorter_column() {
    let table = markdown_status_table(&status_map());
    let lines: Vec<&str> = table.lines().collect();

    // header, separator, three non-200 rows (redirect included)
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[2],
        "| [https://a.test/](https://a.test/) | 200 | [https://a.test/old](https://a.test/old) | 302 |"
    );
    assert!(lines[4].starts_with("|  |  | [https://a.test/x]"));
}
