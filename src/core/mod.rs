//! Core types: errors, configuration, paths, units, cancellation.

pub mod config;
pub mod errors;
pub mod paths;
pub mod signals;
pub mod units;
