//! Links Notation (Lino) run reports.
//!
//! A report collects headless runs (one [`RunRecord`] per algorithm, order
//! and array size) and renders them as Links Notation or as Markdown tables.
//! Links Notation is an indentation-based format of named links:
//!
//! ```text
//! run_report:
//!   timestamp '2024-01-01T00:00:00Z'
//! results:
//!   size_1024:
//!     quick-sort:
//!       steps 2711
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};

use crate::error::Result;

/// One headless run of one algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Catalog name, e.g. `quick-sort`
    pub algorithm: String,
    /// Family name, e.g. `comparison`
    pub family: String,
    /// `ascending` or `descending`
    pub order: String,
    /// Array size in elements
    pub array_size: usize,
    /// Exchanges performed
    pub steps: u64,
    /// Snapshots emitted
    pub snapshots: u64,
    /// Wall time in milliseconds
    pub time_ms: f64,
    /// Whether the output was checked sorted
    pub verified: bool,
}

/// Host the report was produced on.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    /// Available hardware threads
    pub threads: usize,
}

impl Default for SystemInfo {
    fn default() -> Self {
        SystemInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

/// A complete run report.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    pub description: String,
    pub system_info: SystemInfo,
    pub records: Vec<RunRecord>,
}

impl RunReport {
    pub fn new(description: &str) -> Self {
        RunReport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            description: description.to_string(),
            system_info: SystemInfo::default(),
            records: Vec::new(),
        }
    }

    pub fn add_record(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    /// Distinct array sizes, ascending.
    fn sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.records.iter().map(|r| r.array_size).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }

    fn records_of(&self, size: usize) -> impl Iterator<Item = &RunRecord> + Clone {
        self.records.iter().filter(move |r| r.array_size == size)
    }

    pub fn to_lino(&self) -> String {
        Lino(self).to_string()
    }

    pub fn to_markdown_table(&self) -> String {
        Markdown(self).to_string()
    }

    pub fn save_lino(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_lino())?;
        Ok(())
    }

    pub fn save_markdown(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_markdown_table())?;
        Ok(())
    }
}

/// Record with the fewest steps and the fastest record of one size.
fn leaders<'a>(records: impl Iterator<Item = &'a RunRecord> + Clone) -> Option<(&'a RunRecord, &'a RunRecord)> {
    let fewest = records.clone().min_by_key(|r| r.steps)?;
    let fastest = records.min_by(|a, b| a.time_ms.total_cmp(&b.time_ms))?;
    Some((fewest, fastest))
}

struct Lino<'a>(&'a RunReport);

impl fmt::Display for Lino<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "run_report:")?;
        writeln!(f, "  timestamp '{}'", report.timestamp)?;
        writeln!(f, "  description '{}'", escape_lino_string(&report.description))?;

        writeln!(f)?;
        writeln!(f, "system_info:")?;
        writeln!(f, "  os '{}'", escape_lino_string(&report.system_info.os))?;
        writeln!(f, "  arch '{}'", escape_lino_string(&report.system_info.arch))?;
        writeln!(f, "  threads {}", report.system_info.threads)?;

        let sizes = report.sizes();
        writeln!(f)?;
        writeln!(f, "results:")?;
        for &size in &sizes {
            writeln!(f, "  size_{size}:")?;
            for record in report.records_of(size) {
                writeln!(f, "    {}:", record.algorithm)?;
                writeln!(f, "      family {}", record.family)?;
                writeln!(f, "      order {}", record.order)?;
                writeln!(f, "      steps {}", record.steps)?;
                writeln!(f, "      snapshots {}", record.snapshots)?;
                writeln!(f, "      time_ms {:.3}", record.time_ms)?;
                writeln!(f, "      verified {}", record.verified)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "summary:")?;
        for &size in &sizes {
            if let Some((fewest, fastest)) = leaders(report.records_of(size)) {
                writeln!(f, "  size_{size}:")?;
                writeln!(f, "    fewest_steps {}", fewest.algorithm)?;
                writeln!(f, "    fastest {}", fastest.algorithm)?;
            }
        }
        Ok(())
    }
}

struct Markdown<'a>(&'a RunReport);

impl fmt::Display for Markdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "# Sorting Run Report")?;
        writeln!(f)?;
        writeln!(f, "**Timestamp:** {}", report.timestamp)?;
        writeln!(f, "**Description:** {}", report.description)?;
        writeln!(f)?;

        writeln!(f, "## System Information")?;
        writeln!(f)?;
        writeln!(f, "| Property | Value |")?;
        writeln!(f, "|----------|-------|")?;
        writeln!(f, "| OS | {} |", report.system_info.os)?;
        writeln!(f, "| Arch | {} |", report.system_info.arch)?;
        writeln!(f, "| Threads | {} |", report.system_info.threads)?;
        writeln!(f)?;

        let sizes = report.sizes();
        writeln!(f, "## Results")?;
        for &size in &sizes {
            writeln!(f)?;
            writeln!(f, "### {} elements", format_size(size))?;
            writeln!(f)?;
            writeln!(f, "| Algorithm | Family | Order | Steps | Snapshots | Time (ms) | Verified |")?;
            writeln!(f, "|-----------|--------|-------|-------|-----------|-----------|----------|")?;
            for r in report.records_of(size) {
                writeln!(
                    f,
                    "| {} | {} | {} | {} | {} | {:.3} | {} |",
                    r.algorithm,
                    r.family,
                    r.order,
                    r.steps,
                    r.snapshots,
                    r.time_ms,
                    if r.verified { "yes" } else { "NO" }
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "## Summary")?;
        writeln!(f)?;
        writeln!(f, "| Size | Fewest steps | Fastest |")?;
        writeln!(f, "|------|--------------|---------|")?;
        for &size in &sizes {
            if let Some((fewest, fastest)) = leaders(report.records_of(size)) {
                writeln!(
                    f,
                    "| {} | {} ({}) | {} ({:.3} ms) |",
                    format_size(size),
                    fewest.algorithm,
                    fewest.steps,
                    fastest.algorithm,
                    fastest.time_ms
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(f, "*Report generated by sortviz*")
    }
}

/// Escape a string for use in Links Notation (handle single quotes)
fn escape_lino_string(s: &str) -> String {
    s.replace('\'', "\\'")
}

/// Format a size as a human-readable string (e.g., "1K", "1M")
fn format_size(size: usize) -> String {
    if size >= 1_000_000 {
        format!("{}M", size / 1_000_000)
    } else if size >= 1_000 {
        format!("{}K", size / 1_000)
    } else {
        size.to_string()
    }
}

/// Parse a report produced by [`RunReport::to_lino`].
///
/// Returns `None` when the text holds no run records.
pub fn parse_lino_report(content: &str) -> Option<RunReport> {
    let mut report = RunReport::new("Parsed report");
    let mut current_size: Option<usize> = None;
    let mut current: Option<RunRecord> = None;
    let mut in_results = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            "results:" => {
                in_results = true;
                continue;
            }
            "summary:" | "system_info:" => {
                report.records.extend(current.take());
                in_results = false;
                current_size = None;
                continue;
            }
            _ => {}
        }

        if let Some(value) = extract_quoted_value(trimmed, "timestamp") {
            report.timestamp = value;
        } else if let Some(value) = extract_quoted_value(trimmed, "description") {
            report.description = value;
        } else if let Some(value) = extract_quoted_value(trimmed, "os") {
            report.system_info.os = value;
        } else if let Some(value) = extract_quoted_value(trimmed, "arch") {
            report.system_info.arch = value;
        } else if let Some(value) = trimmed.strip_prefix("threads ") {
            if let Ok(threads) = value.parse() {
                report.system_info.threads = threads;
            }
        }

        if !in_results {
            continue;
        }

        if let Some(size) = trimmed.strip_prefix("size_").and_then(|s| s.strip_suffix(':')) {
            report.records.extend(current.take());
            current_size = size.parse().ok();
            continue;
        }

        if let (Some(size), Some(name)) = (current_size, trimmed.strip_suffix(':')) {
            if !name.contains(' ') {
                report.records.extend(current.take());
                current = Some(RunRecord {
                    algorithm: name.to_string(),
                    family: String::new(),
                    order: String::new(),
                    array_size: size,
                    steps: 0,
                    snapshots: 0,
                    time_ms: 0.0,
                    verified: false,
                });
                continue;
            }
        }

        let Some(record) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = trimmed.split_once(' ') else {
            continue;
        };
        match key {
            "family" => record.family = value.to_string(),
            "order" => record.order = value.to_string(),
            "steps" => record.steps = value.parse().unwrap_or_default(),
            "snapshots" => record.snapshots = value.parse().unwrap_or_default(),
            "time_ms" => record.time_ms = value.parse().unwrap_or_default(),
            "verified" => record.verified = value == "true",
            _ => {}
        }
    }
    report.records.extend(current);

    if report.records.is_empty() {
        None
    } else {
        Some(report)
    }
}

/// Value of a `prefix 'quoted'` line, unescaped.
fn extract_quoted_value(line: &str, prefix: &str) -> Option<String> {
    let quoted = line.strip_prefix(prefix)?.strip_prefix(' ')?;
    let inner = quoted.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("\\'", "'"))
}
