//! Post-classification gates applied inside the walk: recency cutoff, then
//! minimum aggregate size.
//!
//! Runs before the prune decision, and a rejected match still prunes its
//! subtree. Nested dependency directories inside a rejected tree are
//! therefore never reported on their own.

#![allow(missing_docs)]

use std::path::Path;
use std::time::SystemTime;

use chrono::{Days, Local};

use crate::scanner::aggregate::{most_recent_modification, size_of};

/// Why a classified directory was not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Modified after the recency cutoff.
    TooRecent,
    /// Aggregate size below the minimum.
    BelowMinSize,
}

/// Outcome of running the filters on one matched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Accept {
        size_bytes: u64,
        last_modified: SystemTime,
    },
    Reject(RejectReason),
}

/// Recency + size gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPipeline {
    cutoff: SystemTime,
    min_size_bytes: u64,
}

impl FilterPipeline {
    pub fn new(cutoff: SystemTime, min_size_bytes: u64) -> Self {
        Self {
            cutoff,
            min_size_bytes,
        }
    }

    pub fn cutoff(&self) -> SystemTime {
        self.cutoff
    }

    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_bytes
    }

    /// Evaluate a matched directory.
    ///
    /// Recency is checked first so the (usually costlier) size walk is skipped
    /// for trees that are still in use.
    pub fn evaluate(&self, path: &Path) -> FilterVerdict {
        let last_modified = most_recent_modification(path);
        if last_modified > self.cutoff {
            return FilterVerdict::Reject(RejectReason::TooRecent);
        }

        let size_bytes = size_of(path);
        if size_bytes < self.min_size_bytes {
            return FilterVerdict::Reject(RejectReason::BelowMinSize);
        }

        FilterVerdict::Accept {
            size_bytes,
            last_modified,
        }
    }
}

/// Cutoff for "untouched for at least `days` days": local calendar date
/// arithmetic, so DST shifts do not move the boundary by an hour.
pub fn recency_cutoff(days: u64) -> SystemTime {
    Local::now()
        .checked_sub_days(Days::new(days))
        .map_or(SystemTime::UNIX_EPOCH, SystemTime::from)
}

/// Whole days elapsed between `since` and `now` (0 if `since` is in the future).
pub fn days_between(since: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(since)
        .map_or(0, |elapsed| elapsed.as_secs() / 86_400)
}
