//! Deletion step: one global confirmation, then recursive removal of every
//! reported dependency directory.
//!
//! Each item is removed independently. A failure is recorded and the
//! remaining items are still attempted. A path that vanished since the scan
//! counts as skipped, not failed.

#![allow(missing_docs)]

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::core::errors::{DcError, Result};
use crate::core::signals::CancellationToken;
use crate::core::units::format_bytes;
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::scanner::walker::FoundDependency;

/// Asks the user (or a stand-in) whether to proceed.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Always gives the same answer. `AutoConfirm(true)` backs `--yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}

/// Line-based prompt: writes `"<prompt> (y/N): "` and reads one answer.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirm<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        let _ = write!(self.output, "{prompt} (y/N): ");
        let _ = self.output.flush();
        let mut answer = String::new();
        if self.input.read_line(&mut answer).is_err() {
            return false;
        }
        is_affirmative(&answer)
    }
}

/// `y` or `yes`, case-insensitive, surrounding whitespace ignored.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionConfig {
    /// Report what would be removed without prompting or touching disk.
    pub dry_run: bool,
}

/// Summary of one deletion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub items_deleted: usize,
    pub items_failed: usize,
    pub items_skipped: usize,
    /// Sum of the scan-time sizes of the deleted items.
    pub bytes_freed: u64,
    pub deleted: Vec<PathBuf>,
    pub errors: Vec<DeletionError>,
    pub dry_run: bool,
    /// False when the user declined (or nothing was offered).
    pub confirmed: bool,
    /// Stopped on a cancellation request; later items were not attempted.
    pub cancelled: bool,
    pub duration: Duration,
}

impl DeletionReport {
    /// Some deletions succeeded or were attempted, but at least one failed.
    pub fn is_partial_failure(&self) -> bool {
        self.items_failed > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionError {
    pub path: PathBuf,
    pub error: String,
    pub error_code: String,
}

/// Removes confirmed dependency directories.
#[derive(Debug)]
pub struct DeletionExecutor<'a> {
    config: DeletionConfig,
    logger: &'a ActivityLogger,
    cancel: Option<CancellationToken>,
}

impl<'a> DeletionExecutor<'a> {
    pub fn new(config: DeletionConfig, logger: &'a ActivityLogger) -> Self {
        Self {
            config,
            logger,
            cancel: None,
        }
    }

    /// Stop before the next removal once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// The confirmation question for `found`.
    pub fn prompt_for(found: &[FoundDependency]) -> String {
        let total: u64 = found.iter().map(|f| f.size_bytes).sum();
        format!(
            "Delete the {} directories above ({})?",
            found.len(),
            format_bytes(total)
        )
    }

    /// Confirm once, then remove each item in order.
    pub fn execute(&self, found: &[FoundDependency], confirm: &mut dyn Confirm) -> DeletionReport {
        let start = Instant::now();
        let mut report = DeletionReport {
            dry_run: self.config.dry_run,
            ..DeletionReport::default()
        };

        if self.config.dry_run || found.is_empty() {
            return report;
        }
        if !confirm.confirm(&Self::prompt_for(found)) {
            return report;
        }
        report.confirmed = true;

        for dep in found {
            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let path = &dep.dependency_path;
            match remove_tree(path) {
                Ok(Removal::Removed) => {
                    report.items_deleted += 1;
                    report.bytes_freed = report.bytes_freed.saturating_add(dep.size_bytes);
                    report.deleted.push(path.clone());
                    self.logger.log(&ActivityEvent::DependencyDeleted {
                        path: path.display().to_string(),
                        size_bytes: dep.size_bytes,
                    });
                }
                Ok(Removal::AlreadyGone) => report.items_skipped += 1,
                Err(e) => {
                    report.items_failed += 1;
                    let error = DeletionError {
                        path: path.clone(),
                        error: e.to_string(),
                        error_code: e.code().to_string(),
                    };
                    self.logger.log(&ActivityEvent::DeletionFailed {
                        path: path.display().to_string(),
                        error_code: error.error_code.clone(),
                        error_message: error.error.clone(),
                    });
                    report.errors.push(error);
                }
            }
        }

        report.duration = start.elapsed();
        report
    }
}

enum Removal {
    Removed,
    AlreadyGone,
}

/// Remove `path` recursively. A symlink is unlinked, never followed.
fn remove_tree(path: &Path) -> Result<Removal> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Removal::AlreadyGone),
        Err(e) => return Err(DcError::io(path, e)),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| DcError::io(path, e))?;
    } else {
        fs::remove_file(path).map_err(|e| DcError::io(path, e))?;
    }
    Ok(Removal::Removed)
}
