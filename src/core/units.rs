//! Byte-size parsing and formatting (binary units: 1 KB = 1024 bytes).

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::sync::LazyLock;

use regex::Regex;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;
pub const GB: u64 = 1024 * MB;

/// Leading decimal number, as accepted by a `%f` scan.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .unwrap_or_else(|e| unreachable!("static size pattern is valid: {e}"))
});

/// Split a size string into its numeric body and byte multiplier.
fn split_unit(raw: &str) -> (String, u64) {
    let upper = raw.trim().to_uppercase();
    for (suffix, multiplier) in [("GB", GB), ("MB", MB), ("KB", KB)] {
        if let Some(body) = upper.strip_suffix(suffix) {
            return (body.trim().to_string(), multiplier);
        }
    }
    (upper, 1)
}

/// Parse a human size threshold such as `100MB`, `1.5gb` or `4096`.
///
/// Parsing is permissive: the numeric part is the longest leading decimal
/// number, anything unparseable yields 0, and negative values clamp to 0.
pub fn parse_size(raw: &str) -> u64 {
    let (body, multiplier) = split_unit(raw);
    let Some(found) = LEADING_NUMBER.find(&body) else {
        return 0;
    };
    let value: f64 = found.as_str().parse().unwrap_or(0.0);
    // Float-to-int `as` saturates: negatives and NaN become 0.
    (value * multiplier as f64) as u64
}

/// Whether `parse_size` can read `raw` without discarding any of it.
pub fn is_well_formed_size(raw: &str) -> bool {
    let (body, _) = split_unit(raw);
    if body.is_empty() {
        return raw.trim().is_empty();
    }
    LEADING_NUMBER
        .find(&body)
        .is_some_and(|m| m.end() == body.len())
}

/// Render a byte count with two decimals in the largest fitting unit.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
