//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use depclean::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DcError, Result};
pub use crate::core::signals::CancellationToken;

// Logger
pub use crate::logger::activity::{ActivityEvent, ActivityLogger};

// Scanner
pub use crate::scanner::deletion::{
    AutoConfirm, Confirm, DeletionConfig, DeletionExecutor, DeletionReport,
};
pub use crate::scanner::report::ReportFormatter;
pub use crate::scanner::rules::{EcosystemRule, EcosystemRuleTable};
pub use crate::scanner::walker::{
    DependencyScanner, FoundDependency, ScanConfig, ScanOutcome, WalkPolicy,
};
