// Status reports built from a crawl's status map

use crate::config::OutputFormat;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use sitewalk_scanner::{FetchOutcome, StatusMap};
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub uri: String,
    pub status: FetchOutcome,
}

impl StatusRecord {
    fn new(uri: &str, status: &FetchOutcome) -> Self {
        Self {
            uri: uri.to_string(),
            status: status.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub ok: usize,
    pub failing: usize,
    pub redirects: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub ok: PathBuf,
    pub failing: PathBuf,
}

/// Splits the status map into the 200 group and the failing group. Redirects
/// (300-399) belong to neither; transport errors are failing. Both lists are
/// ordered by URI.
pub fn split_by_status(status: &StatusMap) -> (Vec<StatusRecord>, Vec<StatusRecord>) {
    let mut ok = Vec::new();
    let mut failing = Vec::new();

    for (uri, outcome) in status.iter() {
        if outcome.is_ok() {
            ok.push(StatusRecord::new(uri, outcome));
        } else if !outcome.is_redirect() {
            failing.push(StatusRecord::new(uri, outcome));
        }
    }

    (ok, failing)
}

pub fn summarize(status: &StatusMap) -> StatusSummary {
    let mut summary = StatusSummary {
        total: status.len(),
        ..Default::default()
    };

    for (_, outcome) in status.iter() {
        if outcome.is_ok() {
            summary.ok += 1;
        } else if outcome.is_redirect() {
            summary.redirects += 1;
        } else {
            summary.failing += 1;
            if matches!(outcome, FetchOutcome::Error(_)) {
                summary.errors += 1;
            }
        }
    }

    summary
}

pub fn write_csv(records: &[StatusRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["uri", "status"])?;
    for record in records {
        writer.write_record([record.uri.as_str(), record.status.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json(records: &[StatusRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    save_report(&json, path)?;
    Ok(())
}

pub fn write_markdown(records: &[StatusRecord], path: &Path) -> Result<()> {
    let mut table = String::from("| URI | Status |\n|-----|--------|\n");
    for record in records {
        table.push_str(&format!(
            "| [{}]({}) | {} |\n",
            record.uri, record.uri, record.status
        ));
    }
    save_report(&table, path)?;
    Ok(())
}

/// Writes `<prefix>_http200.<ext>` and `<prefix>_http_non200.<ext>`.
pub fn write_report(
    ok: &[StatusRecord],
    failing: &[StatusRecord],
    format: OutputFormat,
    prefix: &Path,
) -> Result<ReportPaths> {
    let paths = ReportPaths {
        ok: prefixed_path(prefix, &format!("_http200.{}", format.extension())),
        failing: prefixed_path(prefix, &format!("_http_non200.{}", format.extension())),
    };

    if let Some(parent) = paths.ok.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let writer: fn(&[StatusRecord], &Path) -> Result<()> = match format {
        OutputFormat::Csv => write_csv,
        OutputFormat::Json => write_json,
        OutputFormat::Markdown => write_markdown,
    };
    writer(ok, &paths.ok)?;
    writer(failing, &paths.failing)?;

    Ok(paths)
}

/// [`write_report`] on the blocking pool, for callers on the async runtime.
pub async fn write_report_blocking(
    ok: Vec<StatusRecord>,
    failing: Vec<StatusRecord>,
    format: OutputFormat,
    prefix: PathBuf,
) -> Result<ReportPaths> {
    tokio::task::spawn_blocking(move || write_report(&ok, &failing, format, &prefix))
        .await
        .map_err(|e| CoreError::Io(std::io::Error::other(e)))?
}

/// Side-by-side table of 200 pages and every other page, redirects included.
/// The shorter column is padded with empty cells.
pub fn markdown_status_table(status: &StatusMap) -> String {
    let (ok_rows, fail_rows): (Vec<_>, Vec<_>) =
        status.iter().partition(|(_, outcome)| outcome.is_ok());

    let mut table = String::from(
        "| HTTP 200 URI | Status | HTTP non-200 URI | Status |\n\
         |--------------|--------|-------------------|--------|\n",
    );

    let rows = ok_rows.len().max(fail_rows.len());
    for i in 0..rows {
        let (ok_uri, ok_status) = cell(ok_rows.get(i));
        let (fail_uri, fail_status) = cell(fail_rows.get(i));
        table.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            ok_uri, ok_status, fail_uri, fail_status
        ));
    }

    table
}

fn cell(row: Option<&(&str, &FetchOutcome)>) -> (String, String) {
    match row {
        Some((uri, outcome)) => (format!("[{}]({})", uri, uri), outcome.to_string()),
        None => (String::new(), String::new()),
    }
}

fn prefixed_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
