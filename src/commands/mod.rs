//! Command implementations for the Lookout CLI.
//!
//! The single substantial command is `observe`: fetch the snapshot, run the
//! analysis pipeline, print the report, and optionally persist it with a
//! read-after-write integrity check.

use crate::analysis;
use crate::api::ApiClient;
use crate::config::ObserverConfig;
use crate::models::{ObserverReport, ReportWarning};
use crate::{Error, Result};
use chrono::Utc;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

impl CommandResult for ObserverReport {
    fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        let mut lines = vec![self.summary.clone()];
        if let Some(suggested) = &self.suggested_next {
            lines.push(format!("Next: {} ({})", suggested.title, suggested.node_id));
            lines.push(format!("  {}", suggested.next_action));
            lines.push(format!(
                "  score {} (temp {}, stale {}, status {}, stuck {})",
                suggested.debug.total,
                suggested.debug.breakdown.temp,
                suggested.debug.breakdown.stale,
                suggested.debug.breakdown.status_bonus,
                suggested.debug.breakdown.stuck
            ));
        }
        for proposal in &self.status_proposals {
            lines.push(format!(
                "Proposal: {} {} -> {} ({})",
                proposal.title,
                proposal.current_status,
                proposal.suggested_status,
                proposal.reason
            ));
        }
        for alert in &self.cooling_alerts {
            lines.push(format!("Cooling: {}", alert.message));
        }
        for warning in &self.warnings {
            lines.push(format!("Warning: {}: {}", warning.code, warning.message));
        }
        lines.join("\n")
    }
}

/// Run one observation against the tracker.
///
/// The report is always printed to stdout. With `save`, it is then persisted
/// and read back; with `strict`, a non-empty warnings list becomes a fatal
/// outcome instead of a stderr notice.
pub fn observe(config: &ObserverConfig, save: bool, strict: bool, human: bool) -> Result<()> {
    let client = ApiClient::new(config.base_url(), config.token());

    let snapshot = client.fetch_snapshot()?;
    let report = analysis::observe(&snapshot, &client, &config.cooling, Utc::now());

    if human {
        println!("{}", report.to_human());
    } else {
        println!("{}", report.to_json());
    }

    // When saving, the warnings that count are the ones read back from the
    // store; otherwise the freshly assembled report's own.
    let warnings = if save {
        save_and_verify(&client, &report)?
    } else {
        report.warnings.clone()
    };

    if !warnings.is_empty() {
        print_warnings(&warnings);
        if strict {
            return Err(Error::StrictWarnings {
                count: warnings.len(),
            });
        }
    }

    Ok(())
}

/// Persist the report, then immediately read the latest report back and
/// compare identifying fields. A mismatch signals backend inconsistency and
/// is always fatal. Returns the warnings carried by the stored payload.
fn save_and_verify(client: &ApiClient, report: &ObserverReport) -> Result<Vec<ReportWarning>> {
    let saved = client.save_report(report, report.node_count)?;
    eprintln!(
        "✓ Saved: report_id={} created_at={}",
        saved.report_id, saved.created_at
    );

    let Some(stored) = client.fetch_latest()? else {
        return Err(Error::IntegrityCheck("latest returned no report".to_string()));
    };
    if stored.report_id != saved.report_id {
        return Err(Error::IntegrityCheck(format!(
            "report_id mismatch (saved={:?}, latest={:?})",
            saved.report_id, stored.report_id
        )));
    }
    let payload = stored.payload.unwrap_or_default();
    if payload.summary != report.summary {
        return Err(Error::IntegrityCheck(format!(
            "summary mismatch (expected len={}, got len={})",
            report.summary.chars().count(),
            payload.summary.chars().count()
        )));
    }

    let node_count = payload
        .node_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    let rule_version = payload
        .suggested_next
        .as_ref()
        .map(|s| s.debug.rule_version.clone())
        .unwrap_or_else(|| "-".to_string());
    eprintln!(
        "saved={} latest={} warnings={} node_count={} rule={}",
        saved.report_id,
        stored.report_id,
        payload.warnings.len(),
        node_count,
        rule_version
    );
    eprintln!("✓ healthcheck passed: report_id and summary match latest");

    Ok(payload.warnings)
}

fn print_warnings(warnings: &[ReportWarning]) {
    eprintln!("⚠ Observer report has warnings:");
    for (i, warning) in warnings.iter().enumerate() {
        eprintln!("  [{}] {}: {}", i + 1, warning.code, warning.message);
        if let Some(details) = &warning.details {
            eprintln!("      details: {}", details);
        }
    }
}
