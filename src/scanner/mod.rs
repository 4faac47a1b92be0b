//! Dependency scanner: rule table, walker, aggregates, filters, report, deletion.

pub mod aggregate;
pub mod deletion;
pub mod filter;
pub mod report;
pub mod rules;
pub mod walker;
