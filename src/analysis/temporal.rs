//! Temporal normalization for nodes.
//!
//! Resolves a node's effective "last touched" instant and elapsed days, and
//! normalizes the loosely-typed temperature value. Parsing is lenient by
//! contract: a malformed timestamp is treated exactly like a missing one.

use crate::models::{Node, Temperature};
use chrono::{DateTime, Utc};

/// Neutral default used when a temperature is missing or unparseable.
pub const NEUTRAL_TEMPERATURE: i64 = 50;

/// Parse an ISO 8601 timestamp. Empty or malformed input yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The effective update instant: `updated_at` if parseable, else
/// `created_at` if parseable, else none.
pub fn effective_update(node: &Node) -> Option<DateTime<Utc>> {
    node.updated_at
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| node.created_at.as_deref().and_then(parse_timestamp))
}

/// Whole days elapsed since the effective update instant, or `None` when
/// the node has no resolvable date.
pub fn days_since(node: &Node, now: DateTime<Utc>) -> Option<i64> {
    effective_update(node).map(|dt| (now - dt).num_days())
}

/// Normalize a raw temperature to an integer reading.
///
/// Missing values and unparseable strings both fall back to the neutral
/// default; numeric strings and floats are truncated toward zero.
pub fn normalize_temperature(value: Option<&Temperature>) -> i64 {
    match value {
        None => NEUTRAL_TEMPERATURE,
        Some(Temperature::Int(n)) => *n,
        Some(Temperature::Float(x)) if x.is_finite() => *x as i64,
        Some(Temperature::Float(_)) => NEUTRAL_TEMPERATURE,
        Some(Temperature::Text(s)) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => x as i64,
            _ => NEUTRAL_TEMPERATURE,
        },
    }
}
