//! Snapshot analysis pipeline.
//!
//! Turns a raw snapshot of nodes into an `ObserverReport`:
//! - `temporal` - effective timestamps, elapsed days, temperature normalization
//! - `proposals` - side-effect-free status change proposals via preview
//! - `cooling` - temperature/staleness alerts
//! - `scoring` - the single suggested next action
//! - `consistency` - self-checks over the assembled report's own counts
//!
//! `observe` is the only entry point. It takes `now` explicitly so the whole
//! pipeline is deterministic and replayable in tests.

pub mod consistency;
pub mod cooling;
pub mod proposals;
pub mod scoring;
pub mod temporal;

pub use cooling::CoolingThresholds;
pub use proposals::StatusPreview;

use crate::models::{ObserverReport, ReportMeta, Snapshot};
use chrono::{DateTime, Utc};

/// Summary text for a snapshot with no nodes at all.
pub const EMPTY_SUMMARY: &str = "机の上にノードがありません。";

/// Run the full analysis over a snapshot and assemble the report.
///
/// Preview failures are contained per node inside `proposals::collect`;
/// everything else here is pure computation.
pub fn observe(
    snapshot: &Snapshot,
    preview: &dyn StatusPreview,
    thresholds: &CoolingThresholds,
    now: DateTime<Utc>,
) -> ObserverReport {
    let nodes = snapshot.all_nodes();

    if nodes.is_empty() {
        return ObserverReport {
            suggested_next: None,
            status_proposals: Vec::new(),
            cooling_alerts: Vec::new(),
            summary: EMPTY_SUMMARY.to_string(),
            node_count: 0,
            warnings: Vec::new(),
            meta: ReportMeta {
                observed_at: now,
                freshness_minutes: 0,
            },
        };
    }

    let status_proposals = proposals::collect(&nodes, preview, now);
    let cooling_alerts = cooling::detect(&nodes, thresholds, now);
    let suggested_next = scoring::suggest_next(&nodes, now);

    // Single source of truth for the total: the flattened node list.
    let node_count = nodes.len();
    let summary = build_summary(
        snapshot,
        node_count,
        cooling_alerts.len(),
        status_proposals.len(),
    );
    let warnings = consistency::check(&summary, node_count, &nodes);

    ObserverReport {
        suggested_next,
        status_proposals,
        cooling_alerts,
        summary,
        node_count,
        warnings,
        meta: ReportMeta {
            observed_at: now,
            freshness_minutes: 0,
        },
    }
}

/// Build the summary sentence from the already-computed counts; nothing is
/// recounted here.
fn build_summary(
    snapshot: &Snapshot,
    node_count: usize,
    cooling_count: usize,
    proposal_count: usize,
) -> String {
    let mut parts = vec![format!("机の上に {} 件のノードがあります", node_count)];
    for (tray, label) in [
        ("in_progress", "実施中"),
        ("needs_decision", "判断待ち"),
        ("waiting_external", "外部待ち"),
    ] {
        let count = snapshot.tray_len(tray);
        if count > 0 {
            parts.push(format!("{} {} 件", label, count));
        }
    }
    if cooling_count > 0 {
        parts.push(format!("冷却確認 {} 件", cooling_count));
    }
    if proposal_count > 0 {
        parts.push(format!("状態変更の提案 {} 件", proposal_count));
    }
    format!("{}。", parts.join("。"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, PreviewResponse, SuggestedStatus};
    use chrono::Duration;

    /// Preview stub that always agrees (no suggestion).
    struct SilentPreview;

    impl StatusPreview for SilentPreview {
        fn preview_status(&self, _: &str, _: &str) -> Result<PreviewResponse, ApiError> {
            Ok(PreviewResponse {
                ok: true,
                ..PreviewResponse::default()
            })
        }
    }

    /// Preview stub that always suggests the given status.
    struct AlwaysSuggest(&'static str);

    impl StatusPreview for AlwaysSuggest {
        fn preview_status(&self, _: &str, _: &str) -> Result<PreviewResponse, ApiError> {
            Ok(PreviewResponse {
                ok: true,
                suggested: Some(SuggestedStatus {
                    status: self.0.to_string(),
                    reason: "観測による提案".to_string(),
                }),
                error: None,
            })
        }
    }

    fn now() -> DateTime<Utc> {
        temporal::parse_timestamp("2026-08-01T00:00:00Z").unwrap()
    }

    fn snapshot(json: serde_json::Value) -> Snapshot {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_empty_snapshot_short_circuits() {
        let report = observe(
            &Snapshot::default(),
            &SilentPreview,
            &CoolingThresholds::default(),
            now(),
        );
        assert_eq!(report.node_count, 0);
        assert_eq!(report.summary, EMPTY_SUMMARY);
        assert!(report.suggested_next.is_none());
        assert!(report.status_proposals.is_empty());
        assert!(report.cooling_alerts.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.meta.observed_at, now());
        assert_eq!(report.meta.freshness_minutes, 0);
    }

    #[test]
    fn test_report_counts_are_consistent() {
        let updated = (now() - Duration::days(10)).to_rfc3339();
        let snap = snapshot(serde_json::json!({"trays": {
            "in_progress": [
                {"id": "a", "status": "IN_PROGRESS", "updated_at": updated},
            ],
            "waiting_external": [
                {"id": "b", "status": "WAITING_EXTERNAL", "temperature": 20, "updated_at": updated},
            ],
        }}));
        let report = observe(&snap, &SilentPreview, &CoolingThresholds::default(), now());
        assert_eq!(report.node_count, 2);
        assert!(report.summary.starts_with("机の上に 2 件のノードがあります"));
        assert!(report.summary.contains("実施中 1 件"));
        assert!(report.summary.contains("外部待ち 1 件"));
        assert!(report.warnings.is_empty());

        // Both nodes are 10 days stale, so both cool and the summary says so.
        assert_eq!(report.cooling_alerts.len(), 2);
        assert!(report.summary.contains("冷却確認 2 件"));

        // The cold waiting-external node outranks the stale in-progress one.
        let suggested = report.suggested_next.unwrap();
        assert_eq!(suggested.node_id, "b");
        assert_eq!(suggested.debug.total, 75);
    }

    #[test]
    fn test_proposals_are_counted_in_summary() {
        let snap = snapshot(serde_json::json!({"trays": {
            "ready": [{"id": "a", "status": "READY", "updated_at": now().to_rfc3339()}],
        }}));
        let report = observe(
            &snap,
            &AlwaysSuggest("COOLING"),
            &CoolingThresholds::default(),
            now(),
        );
        assert_eq!(report.status_proposals.len(), 1);
        assert!(report.summary.contains("状態変更の提案 1 件"));
    }

    #[test]
    fn test_report_serializes_with_null_suggestion() {
        let report = observe(
            &Snapshot::default(),
            &SilentPreview,
            &CoolingThresholds::default(),
            now(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["suggested_next"].is_null());
        assert_eq!(json["node_count"], 0);
        assert_eq!(json["meta"]["freshness_minutes"], 0);
    }
}
