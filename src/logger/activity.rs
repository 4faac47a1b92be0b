//! Activity events and the logger handle passed to the scanner and deleter.
//!
//! A disabled logger is the default: every `log` call is then a no-op, so
//! callers never branch on whether logging is configured.

#![allow(missing_docs)]

use std::path::Path;

use parking_lot::Mutex;

use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Events emitted over one `depclean` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    ScanStarted {
        root: String,
        max_depth: usize,
        days: u64,
        min_size_bytes: u64,
    },
    DependencyFound {
        path: String,
        project: String,
        ecosystem: String,
        size_bytes: u64,
        days_since: u64,
    },
    ScanCompleted {
        found: usize,
        total_bytes: u64,
        directories_visited: usize,
        duration_ms: u64,
    },
    ScanCancelled {
        found: usize,
        directories_visited: usize,
    },
    DependencyDeleted {
        path: String,
        size_bytes: u64,
    },
    DeletionFailed {
        path: String,
        error_code: String,
        error_message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Optional JSONL sink shared by reference.
#[derive(Default)]
pub struct ActivityLogger {
    writer: Option<Mutex<JsonlWriter>>,
}

impl std::fmt::Debug for ActivityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLogger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl ActivityLogger {
    /// A logger that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Self {
        Self {
            writer: Some(Mutex::new(JsonlWriter::open(JsonlConfig::new(path)))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn log(&self, event: &ActivityEvent) {
        let Some(writer) = &self.writer else {
            return;
        };
        writer.lock().write_entry(&event_to_log_entry(event));
    }

    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.lock().flush();
        }
    }
}

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::ScanStarted {
            root,
            max_depth,
            days,
            min_size_bytes,
        } => {
            let mut e = LogEntry::new(EventType::ScanStart, Severity::Info);
            e.path = Some(root.clone());
            e.details = Some(format!(
                "max_depth={max_depth} days={days} min_size={min_size_bytes}"
            ));
            e
        }
        ActivityEvent::DependencyFound {
            path,
            project,
            ecosystem,
            size_bytes,
            days_since,
        } => {
            let mut e = LogEntry::new(EventType::DependencyFound, Severity::Info);
            e.path = Some(path.clone());
            e.project = Some(project.clone());
            e.ecosystem = Some(ecosystem.clone());
            e.size = Some(*size_bytes);
            e.days_since = Some(*days_since);
            e
        }
        ActivityEvent::ScanCompleted {
            found,
            total_bytes,
            directories_visited,
            duration_ms,
        } => {
            let mut e = LogEntry::new(EventType::ScanComplete, Severity::Info);
            e.count = Some(*found);
            e.size = Some(*total_bytes);
            e.duration_ms = Some(*duration_ms);
            e.details = Some(format!("directories_visited={directories_visited}"));
            e.ok = Some(true);
            e
        }
        ActivityEvent::ScanCancelled {
            found,
            directories_visited,
        } => {
            let mut e = LogEntry::new(EventType::ScanCancelled, Severity::Warning);
            e.count = Some(*found);
            e.details = Some(format!("directories_visited={directories_visited}"));
            e.ok = Some(false);
            e
        }
        ActivityEvent::DependencyDeleted { path, size_bytes } => {
            let mut e = LogEntry::new(EventType::DependencyDelete, Severity::Info);
            e.path = Some(path.clone());
            e.size = Some(*size_bytes);
            e.ok = Some(true);
            e
        }
        ActivityEvent::DeletionFailed {
            path,
            error_code,
            error_message,
        } => {
            let mut e = LogEntry::new(EventType::DeletionFailed, Severity::Warning);
            e.path = Some(path.clone());
            e.error_code = Some(error_code.clone());
            e.error_message = Some(error_message.clone());
            e.ok = Some(false);
            e
        }
        ActivityEvent::Error { code, message } => {
            let mut e = LogEntry::new(EventType::Error, Severity::Critical);
            e.error_code = Some(code.clone());
            e.error_message = Some(message.clone());
            e
        }
    }
}
