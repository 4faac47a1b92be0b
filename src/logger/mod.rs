//! Structured activity logging: JSONL writer plus the event model.

pub mod activity;
pub mod jsonl;
