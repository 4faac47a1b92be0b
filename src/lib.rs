#![forbid(unsafe_code)]

//! depclean: find stale dependency directories (`node_modules`, `target`,
//! `venv`, `vendor`, ...) under a root and optionally delete them.
//!
//! A scan is a single depth-first walk. Each directory is classified against
//! an ordered ecosystem rule table; a match is then gated on recency and size
//! and is terminal for its subtree whatever the verdict.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use depclean::prelude::*;
//!
//! let scanner = DependencyScanner::default();
//! let outcome = scanner.scan(&ScanConfig::new("/home/me/code").with_recency_days(60));
//! for dep in &outcome.found {
//!     println!("{} {}", dep.ecosystem, dep.dependency_path.display());
//! }
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod scanner;
