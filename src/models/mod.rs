//! Data models for Lookout entities.
//!
//! This module defines the core data structures:
//! - `Node` - A unit of tracked work with status, temperature, and timestamps
//! - `NodeStatus` - Closed status enumeration, normalized at the ingestion boundary
//! - `Temperature` - Raw wire temperature value (number, numeric string, or junk)
//! - `Snapshot` - Tray-name keyed grouping of nodes as served by the tracker
//! - `ObserverReport` - The immutable root artifact assembled per invocation,
//!   plus its parts (`SuggestedNext`, `StatusProposal`, `CoolingAlert`, warnings)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder title shown when a node carries neither `title` nor `name`.
pub const UNTITLED: &str = "(タイトルなし)";

/// Node status in the tracker workflow.
///
/// Wire values are SCREAMING_SNAKE strings. Anything the tracker sends that
/// is not in the closed set (including blank or absent) is captured as
/// `Unknown` with the trimmed raw string, so it can still be echoed back in
/// proposals and rationales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStatus {
    Ready,
    InProgress,
    Blocked,
    NeedsDecision,
    WaitingExternal,
    Clarifying,
    Done,
    Cooling,
    Cancelled,
    Unknown(String),
}

impl NodeStatus {
    /// Normalize a wire string into a status. Trims whitespace; blank or
    /// unrecognized values become `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "READY" => NodeStatus::Ready,
            "IN_PROGRESS" => NodeStatus::InProgress,
            "BLOCKED" => NodeStatus::Blocked,
            "NEEDS_DECISION" => NodeStatus::NeedsDecision,
            "WAITING_EXTERNAL" => NodeStatus::WaitingExternal,
            "CLARIFYING" => NodeStatus::Clarifying,
            "DONE" => NodeStatus::Done,
            "COOLING" => NodeStatus::Cooling,
            "CANCELLED" => NodeStatus::Cancelled,
            other => NodeStatus::Unknown(other.to_string()),
        }
    }

    /// The wire representation (canonical name, or the raw string for
    /// unrecognized values).
    pub fn as_str(&self) -> &str {
        match self {
            NodeStatus::Ready => "READY",
            NodeStatus::InProgress => "IN_PROGRESS",
            NodeStatus::Blocked => "BLOCKED",
            NodeStatus::NeedsDecision => "NEEDS_DECISION",
            NodeStatus::WaitingExternal => "WAITING_EXTERNAL",
            NodeStatus::Clarifying => "CLARIFYING",
            NodeStatus::Done => "DONE",
            NodeStatus::Cooling => "COOLING",
            NodeStatus::Cancelled => "CANCELLED",
            NodeStatus::Unknown(raw) => raw,
        }
    }

    /// Terminal statuses are excluded from next-action candidacy.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeStatus::Done | NodeStatus::Cooling | NodeStatus::Cancelled
        )
    }

    /// Bucket key for the per-status histogram. Blank unknowns are grouped
    /// under `UNKNOWN`.
    pub fn histogram_key(&self) -> &str {
        match self {
            NodeStatus::Unknown(raw) if raw.is_empty() => "UNKNOWN",
            other => other.as_str(),
        }
    }
}

impl Default for NodeStatus {
    fn default() -> Self {
        NodeStatus::Unknown(String::new())
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // null and missing (via #[serde(default)]) both collapse to Unknown("")
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(NodeStatus::parse(raw.as_deref().unwrap_or("")))
    }
}

/// Raw temperature value as it appears on the wire.
///
/// The tracker stores an integer 0-100, but real snapshots also contain
/// numeric strings and the occasional junk value. The raw form is preserved
/// here so alerts can echo it verbatim; normalization happens in
/// `analysis::temporal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Temperature {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Int(n) => write!(f, "{}", n),
            Temperature::Float(x) => write!(f, "{}", x),
            Temperature::Text(s) => f.write_str(s),
        }
    }
}

/// A unit of tracked work, as served by the dashboard endpoint.
///
/// Timestamps are kept as raw strings; they are parsed leniently by the
/// temporal model so a malformed value degrades to "no date" instead of
/// failing ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Opaque stable identifier
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Alternate display name (fallback when `title` is absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: NodeStatus,

    /// Recency/salience signal, 0-100; lower means colder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,

    /// Last update timestamp (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Creation timestamp (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Node {
    /// Display title: `title`, else `name`, else a fixed placeholder.
    /// Empty strings count as absent.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(UNTITLED)
    }
}

/// A snapshot of active nodes, grouped into named trays.
///
/// Trays are used only for summary counts; the node total is always the
/// length of the flattened node list, computed exactly once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub trays: BTreeMap<String, Vec<Node>>,
}

impl Snapshot {
    /// All nodes across all trays, in deterministic (tray-name) order.
    pub fn all_nodes(&self) -> Vec<&Node> {
        self.trays.values().flatten().collect()
    }

    /// Number of nodes in the named tray (0 when the tray is absent).
    pub fn tray_len(&self, name: &str) -> usize {
        self.trays.get(name).map_or(0, Vec::len)
    }
}

/// A status change suggested by the tracker's preview capability, recorded
/// only when it disagrees with the node's current status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusProposal {
    pub node_id: String,
    pub title: String,
    pub current_status: NodeStatus,
    pub suggested_status: NodeStatus,
    pub reason: String,
}

/// An alert for a node that looks abandoned (cold and/or stale).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoolingAlert {
    pub node_id: String,
    pub title: String,
    /// Raw temperature value, echoed as received
    pub temperature: Option<Temperature>,
    /// Effective update instant (ISO 8601), or the raw `updated_at` string
    /// when no timestamp could be resolved
    pub last_updated: String,
    pub message: String,
}

/// Per-component score breakdown for the suggested next action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub temp: i64,
    pub stale: i64,
    pub status_bonus: i64,
    pub stuck: i64,
}

/// Scoring transparency attached to a suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDebug {
    pub total: i64,
    pub breakdown: ScoreBreakdown,
    pub rule_version: String,
}

/// The single top-ranked actionable node for this invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedNext {
    pub node_id: String,
    pub title: String,
    pub reason: String,
    pub next_action: String,
    pub debug: ScoreDebug,
}

/// Warning codes raised by the report's self-consistency checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    SummaryMismatch,
    CountMismatch,
}

impl WarningCode {
    /// The wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::SummaryMismatch => "SUMMARY_MISMATCH",
            WarningCode::CountMismatch => "COUNT_MISMATCH",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An advisory warning attached to a report. Never aborts report
/// generation; strict mode escalates it at the process boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Freshness metadata stamped at assembly time.
///
/// `freshness_minutes` is always 0 at creation; viewers recompute it from
/// `observed_at` when rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub observed_at: DateTime<Utc>,
    pub freshness_minutes: i64,
}

/// The root report artifact. Constructed fresh per invocation, never
/// mutated after assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverReport {
    /// At most one suggestion per report; serialized as null when absent
    pub suggested_next: Option<SuggestedNext>,
    pub status_proposals: Vec<StatusProposal>,
    pub cooling_alerts: Vec<CoolingAlert>,
    pub summary: String,
    pub node_count: usize,
    pub warnings: Vec<ReportWarning>,
    pub meta: ReportMeta,
}
