//! Report rendering: fixed-width table for humans, JSON for machines.
//!
//! Rows keep discovery order. Nothing here decides what is reported.

#![allow(missing_docs)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::units::format_bytes;
use crate::scanner::walker::FoundDependency;

/// Display width budget for the project column.
pub const PROJECT_WIDTH: usize = 38;
/// Display width budget for paths in per-item deletion lines.
pub const DELETED_PATH_WIDTH: usize = 50;

const RULE_WIDTH: usize = 90;

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub project: String,
    pub ecosystem: String,
    pub size: String,
    pub days_since: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonDependency {
    pub project: PathBuf,
    pub path: PathBuf,
    pub ecosystem: String,
    pub size_bytes: u64,
    pub size: String,
    pub days_since: u64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub root: PathBuf,
    pub dependencies: Vec<JsonDependency>,
    pub total_count: usize,
    pub total_bytes: u64,
    pub total_size: String,
    pub cancelled: bool,
}

/// Formats a list of found dependencies.
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    home: Option<PathBuf>,
}

impl ReportFormatter {
    /// `home` is replaced by `~` in displayed paths.
    pub fn new(home: Option<PathBuf>) -> Self {
        Self { home }
    }

    pub fn shorten(&self, path: &Path, max_len: usize) -> String {
        truncate_path(path, self.home.as_deref(), max_len)
    }

    pub fn rows(&self, found: &[FoundDependency]) -> Vec<ReportRow> {
        found
            .iter()
            .map(|dep| ReportRow {
                project: self.shorten(&dep.project_path, PROJECT_WIDTH),
                ecosystem: dep.ecosystem.clone(),
                size: format_bytes(dep.size_bytes),
                days_since: dep.days_since,
            })
            .collect()
    }

    /// Column-aligned table with header, rows and a total line.
    pub fn render_table(&self, found: &[FoundDependency]) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{:<40} {:<12} {:<10} {}", "Project", "Type", "Size", "Idle");
        let _ = writeln!(out, "{rule}");
        for row in self.rows(found) {
            let _ = writeln!(
                out,
                "{:<40} {:<12} {:<10} {} days",
                row.project, row.ecosystem, row.size, row.days_since
            );
        }
        let _ = writeln!(out, "{rule}");
        let total_line = format!(
            "{:<40} {:<12} {:<10}",
            format!("Total {}", found.len()),
            "",
            format_bytes(total_bytes(found))
        );
        let _ = writeln!(out, "{}", total_line.trim_end());
        out
    }

    pub fn to_json(&self, root: &Path, found: &[FoundDependency], cancelled: bool) -> JsonReport {
        let total = total_bytes(found);
        JsonReport {
            root: root.to_path_buf(),
            dependencies: found
                .iter()
                .map(|dep| JsonDependency {
                    project: dep.project_path.clone(),
                    path: dep.dependency_path.clone(),
                    ecosystem: dep.ecosystem.clone(),
                    size_bytes: dep.size_bytes,
                    size: format_bytes(dep.size_bytes),
                    days_since: dep.days_since,
                    last_modified: DateTime::<Utc>::from(dep.last_modified),
                })
                .collect(),
            total_count: found.len(),
            total_bytes: total,
            total_size: format_bytes(total),
            cancelled,
        }
    }
}

pub fn total_bytes(found: &[FoundDependency]) -> u64 {
    found
        .iter()
        .fold(0u64, |acc, dep| acc.saturating_add(dep.size_bytes))
}

/// Replace a leading `home` with `~`, then keep the last `max_len - 3`
/// characters behind a `...` if the result is still too long.
pub fn truncate_path(path: &Path, home: Option<&Path>, max_len: usize) -> String {
    let display = match home.and_then(|h| path.strip_prefix(h).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    };

    let len = display.chars().count();
    if len <= max_len {
        return display;
    }
    let keep = max_len.saturating_sub(3);
    let tail: String = display.chars().skip(len - keep).collect();
    format!("...{tail}")
}
