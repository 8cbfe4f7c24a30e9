//! Cooling detection.
//!
//! Flags nodes that look abandoned: temperature below the configured
//! threshold, staleness past the configured day count, or both. Every node
//! is checked, terminal statuses included. A node with neither a
//! temperature nor a resolvable date is never flagged here.

use crate::analysis::temporal;
use crate::models::{CoolingAlert, Node};
use chrono::{DateTime, Utc};

/// Configurable cooling thresholds.
#[derive(Debug, Clone, Copy)]
pub struct CoolingThresholds {
    /// Flag when the temperature reading drops below this value
    pub temperature: i64,
    /// Flag when this many days pass without an update
    pub days: i64,
}

impl Default for CoolingThresholds {
    fn default() -> Self {
        Self {
            temperature: 40,
            days: 7,
        }
    }
}

/// Detect cooling nodes. When both signals fire for one node, both reasons
/// are concatenated into a single alert message.
pub fn detect(nodes: &[&Node], thresholds: &CoolingThresholds, now: DateTime<Utc>) -> Vec<CoolingAlert> {
    let mut alerts = Vec::new();

    for node in nodes {
        let mut reasons: Vec<String> = Vec::new();

        if let Some(temp) = &node.temperature {
            if temporal::normalize_temperature(Some(temp)) < thresholds.temperature {
                reasons.push(format!("温度が{}に低下", temp));
            }
        }

        if let Some(days) = temporal::days_since(node, now) {
            if days >= thresholds.days {
                reasons.push(format!("{}日間更新がありません", days));
            }
        }

        if reasons.is_empty() {
            continue;
        }

        let title = node.display_title().to_string();
        let last_updated = temporal::effective_update(node)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| node.updated_at.clone().unwrap_or_default());
        alerts.push(CoolingAlert {
            node_id: node.id.clone(),
            title: title.clone(),
            temperature: node.temperature.clone(),
            last_updated,
            message: format!("「{}」は{}。止めてよいですか？", title, reasons.join(" / ")),
        });
    }

    alerts
}
