//! Report self-consistency checks.
//!
//! Two independent cross-checks over the assembled report: the leading
//! count embedded in the summary text, and the per-status histogram sum.
//! Both are advisory; they annotate the report but never abort it.

use crate::models::{Node, ReportWarning, WarningCode};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SUMMARY_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"机の上に\s*(\d+)\s*件").expect("summary count pattern"));

/// Run both consistency checks against the assembled summary and node set.
pub fn check(summary: &str, node_count: usize, nodes: &[&Node]) -> Vec<ReportWarning> {
    let mut warnings = Vec::new();

    // (1) Leading count in the summary text must equal node_count.
    if let Some(caps) = SUMMARY_COUNT_RE.captures(summary) {
        if let Ok(summary_total) = caps[1].parse::<usize>() {
            if summary_total != node_count {
                warnings.push(ReportWarning {
                    code: WarningCode::SummaryMismatch,
                    message: "node_count と summary の件数が一致しません".to_string(),
                    details: Some(serde_json::json!({
                        "node_count": node_count,
                        "summary_total": summary_total,
                    })),
                });
            }
        }
    }

    // (2) The per-status histogram must sum to node_count.
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for node in nodes {
        *by_status
            .entry(node.status.histogram_key().to_string())
            .or_insert(0) += 1;
    }
    let status_sum: usize = by_status.values().sum();
    if status_sum != node_count {
        warnings.push(ReportWarning {
            code: WarningCode::CountMismatch,
            message: "node_count と status 集計の合計が一致しません".to_string(),
            details: Some(serde_json::json!({
                "node_count": node_count,
                "status_sum": status_sum,
                "by_status": by_status,
            })),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;

    fn node(json: serde_json::Value) -> Node {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_consistent_report_has_no_warnings() {
        let a = node(serde_json::json!({"id": "a", "status": "READY"}));
        let b = node(serde_json::json!({"id": "b"}));
        let warnings = check("机の上に 2 件のノードがあります。", 2, &[&a, &b]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_summary_mismatch_is_flagged() {
        let a = node(serde_json::json!({"id": "a", "status": "READY"}));
        let warnings = check("机の上に 5 件のノードがあります。", 1, &[&a]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::SummaryMismatch);
        let details = warnings[0].details.as_ref().unwrap();
        assert_eq!(details["node_count"], 1);
        assert_eq!(details["summary_total"], 5);
    }

    #[test]
    fn test_count_mismatch_is_flagged_with_details() {
        // node_count claims 3 but only 2 nodes are present; the blank-status
        // node lands in the UNKNOWN bucket and the sum still disagrees.
        let a = node(serde_json::json!({"id": "a", "status": "READY"}));
        let b = node(serde_json::json!({"id": "b", "status": ""}));
        let warnings = check("机の上に 3 件のノードがあります。", 3, &[&a, &b]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::CountMismatch);
        let details = warnings[0].details.as_ref().unwrap();
        assert_eq!(details["node_count"], 3);
        assert_eq!(details["status_sum"], 2);
        assert_eq!(details["by_status"]["READY"], 1);
        assert_eq!(details["by_status"]["UNKNOWN"], 1);
    }

    #[test]
    fn test_both_checks_fire_independently() {
        let a = node(serde_json::json!({"id": "a", "status": "READY"}));
        let warnings = check("机の上に 9 件のノードがあります。", 2, &[&a]);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].code, WarningCode::SummaryMismatch);
        assert_eq!(warnings[1].code, WarningCode::CountMismatch);
    }

    #[test]
    fn test_summary_without_count_skips_first_check() {
        let a = node(serde_json::json!({"id": "a", "status": "READY"}));
        let warnings = check("机の上にノードがありません。", 1, &[&a]);
        // No leading count to parse; only the histogram check applies.
        assert!(warnings.is_empty());
    }
}
