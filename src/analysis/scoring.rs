//! Next-action scoring.
//!
//! Ranks all non-terminal nodes by a weighted score with a deterministic
//! tie-break chain and selects exactly one suggestion per invocation. The
//! component weights are a fixed policy table; changing them changes which
//! node wins ties, so they are deliberately not configurable.

use crate::analysis::temporal;
use crate::models::{Node, NodeStatus, ScoreBreakdown, ScoreDebug, SuggestedNext};
use chrono::{DateTime, Utc};

/// Version tag recorded in every suggestion's debug block.
pub const RULE_VERSION: &str = "3-4.0";

/// Temperature at or below which the cold bonus applies.
const TEMPERATURE_LOW_THRESHOLD: i64 = 40;

/// Days without update after which any node counts as stale.
const STALE_DAYS: i64 = 7;

/// Days without update after which an in-progress node counts as stuck.
const IN_PROGRESS_STALE_DAYS: i64 = 3;

/// Tie-break key for the effective update instant. A missing date must sort
/// after every real timestamp, so the enum keeps `Missing` as the greater
/// variant instead of leaning on sentinel strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TieBreak {
    At(DateTime<Utc>),
    Missing,
}

/// Compute the four score components for a candidate node.
pub fn score_node(node: &Node, now: DateTime<Utc>) -> (i64, ScoreBreakdown) {
    let temp_val = temporal::normalize_temperature(node.temperature.as_ref());
    let effective = temporal::effective_update(node);
    let days = effective.map(|dt| (now - dt).num_days());
    let no_date = effective.is_none();

    let temp = if temp_val <= TEMPERATURE_LOW_THRESHOLD {
        30
    } else {
        0
    };
    // A node with no resolvable date counts as stale.
    let stale = if no_date || days.is_some_and(|d| d >= STALE_DAYS) {
        25
    } else {
        0
    };
    let status_bonus = match node.status {
        NodeStatus::WaitingExternal => 20,
        NodeStatus::Clarifying => 15,
        NodeStatus::NeedsDecision => 12,
        NodeStatus::Ready => 10,
        NodeStatus::Blocked => 8,
        _ => 0,
    };
    let stuck = if node.status == NodeStatus::InProgress
        && (no_date || days.is_some_and(|d| d >= IN_PROGRESS_STALE_DAYS))
    {
        15
    } else {
        0
    };

    let total = temp + stale + status_bonus + stuck;
    (
        total,
        ScoreBreakdown {
            temp,
            stale,
            status_bonus,
            stuck,
        },
    )
}

/// Select the single suggested next action from a snapshot's nodes.
///
/// Terminal-status nodes are excluded up front. Candidates are ordered by
/// total score descending, then oldest effective update (date-less nodes
/// last), then node id. Returns `None` when no candidate exists.
pub fn suggest_next(nodes: &[&Node], now: DateTime<Utc>) -> Option<SuggestedNext> {
    let mut candidates: Vec<(&Node, i64, ScoreBreakdown, TieBreak)> = nodes
        .iter()
        .filter(|n| !n.status.is_terminal())
        .map(|n| {
            let (total, breakdown) = score_node(n, now);
            let tie = match temporal::effective_update(n) {
                Some(dt) => TieBreak::At(dt),
                None => TieBreak::Missing,
            };
            (*n, total, breakdown, tie)
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.3.cmp(&b.3))
            .then_with(|| a.0.id.cmp(&b.0.id))
    });

    let (best, total, breakdown, _) = candidates.into_iter().next()?;
    let title = best.display_title().to_string();
    Some(SuggestedNext {
        node_id: best.id.clone(),
        title: title.clone(),
        reason: reason_for(&best.status),
        next_action: next_action_for(&best.status, &title),
        debug: ScoreDebug {
            total,
            breakdown,
            rule_version: RULE_VERSION.to_string(),
        },
    })
}

/// Human rationale keyed by status, with a generic fallback for anything
/// outside the mapped set.
fn reason_for(status: &NodeStatus) -> String {
    match status {
        NodeStatus::InProgress => "実施中で最もスコアが高いノードです".to_string(),
        NodeStatus::NeedsDecision => "判断待ちのノードがあります".to_string(),
        NodeStatus::Ready => "着手可能な状態です".to_string(),
        NodeStatus::Blocked => "障害がありますが、解消すれば進められます".to_string(),
        NodeStatus::WaitingExternal => "外部からの返答を確認してみてください".to_string(),
        NodeStatus::Clarifying => "言語化・整理が必要なノードです".to_string(),
        other => format!("{} のノードです", other.as_str()),
    }
}

/// Concrete next-action text built from a status-keyed template with the
/// node title substituted.
fn next_action_for(status: &NodeStatus, title: &str) -> String {
    let template = match status {
        NodeStatus::WaitingExternal => {
            "「{title}」の相手に確認する（メール・電話・チャットのどれか 1 本）"
        }
        NodeStatus::Clarifying => "「{title}」の不明点を 1 つだけ質問にまとめる",
        NodeStatus::Ready => "「{title}」の最初の 10 分でできるタスクを 1 つやる",
        NodeStatus::InProgress => "「{title}」で詰まっていないか確認し、次の一手を決める",
        NodeStatus::NeedsDecision => "「{title}」の判断材料を確認し、決断する",
        NodeStatus::Blocked => "「{title}」の障害内容を確認し、解消策を検討する",
        _ => "「{title}」の context を確認し、次の一手を決める",
    };
    template.replace("{title}", title)
}
