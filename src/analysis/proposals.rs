//! Status proposal generation.
//!
//! For each node, builds an intent string strictly from observed facts and
//! asks the tracker's preview capability whether a different status is
//! warranted. A proposal is recorded only when the preview disagrees with
//! the node's current status. Preview failures skip the node; one bad node
//! never aborts the pipeline.

use crate::analysis::temporal;
use crate::api::{ApiError, PreviewResponse};
use crate::models::{Node, NodeStatus, StatusProposal};
use chrono::{DateTime, Utc};

/// Read-only status preview capability.
///
/// Implemented by the API client against the live tracker, and by stubs in
/// tests. Implementations must be side-effect free.
pub trait StatusPreview {
    fn preview_status(&self, node_id: &str, intent: &str) -> Result<PreviewResponse, ApiError>;
}

/// Build the observation-only intent text for a node: elapsed days, raw
/// temperature, and current status. No derived judgments.
pub fn build_intent(node: &Node, now: DateTime<Utc>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(days) = temporal::days_since(node, now) {
        parts.push(format!("最終更新から{}日経過", days));
    }
    if let Some(temp) = &node.temperature {
        parts.push(format!("温度{}", temp));
    }
    parts.push(format!("現在{}", node.status.as_str()));
    parts.join("、")
}

/// Run the preview for every node, collecting proposals where the suggested
/// status differs from the current one.
pub fn collect(
    nodes: &[&Node],
    preview: &dyn StatusPreview,
    now: DateTime<Utc>,
) -> Vec<StatusProposal> {
    let mut proposals = Vec::new();

    for node in nodes {
        let intent = build_intent(node, now);
        // Partial observation is acceptable; a failed preview only costs
        // this node's contribution.
        let response = match preview.preview_status(&node.id, &intent) {
            Ok(response) => response,
            Err(_) => continue,
        };
        let Some(suggested) = response.suggested else {
            continue;
        };
        let suggested_status = NodeStatus::parse(&suggested.status);
        if suggested_status != node.status {
            proposals.push(StatusProposal {
                node_id: node.id.clone(),
                title: node.display_title().to_string(),
                current_status: node.status.clone(),
                suggested_status,
                reason: suggested.reason,
            });
        }
    }

    proposals
}
