//! Invocation logging for Lookout runs.
//!
//! Appends one JSONL entry per invocation to a local log file. This is the
//! observer's own operational trail and the only local write it performs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory (used by tests).
pub const DATA_DIR_ENV: &str = "LOOKOUT_DATA_DIR";

/// Environment variable disabling the run log ("0" or "false").
pub const RUN_LOG_ENV: &str = "LOOKOUT_RUN_LOG";

/// Represents a single run log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunLog {
    /// ISO 8601 timestamp when the run occurred
    pub timestamp: DateTime<Utc>,

    /// Command name (e.g., "observe", "build-info")
    pub command: String,

    /// Tracker base URL the run targeted
    pub base_url: String,

    /// Whether the run succeeded
    pub success: bool,

    /// Error message if the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Run duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Log a run to the local log file.
///
/// This function never fails - it silently falls back on errors to avoid
/// breaking an observation due to logging issues.
pub fn log_run(
    command: &str,
    base_url: &str,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    if !enabled() {
        return;
    }

    let Some(log_path) = log_path() else {
        return;
    };

    let entry = RunLog {
        timestamp: Utc::now(),
        command: command.to_string(),
        base_url: base_url.to_string(),
        success,
        error,
        duration_ms,
        user: current_user(),
    };

    if let Err(e) = write_entry(&log_path, &entry) {
        eprintln!("Warning: Failed to write run log: {}", e);
    }
}

fn enabled() -> bool {
    match std::env::var(RUN_LOG_ENV) {
        Ok(value) => {
            let value = value.to_lowercase();
            value != "0" && value != "false" && value != "no"
        }
        Err(_) => true,
    }
}

/// The log file path: `$LOOKOUT_DATA_DIR/run.log`, defaulting to
/// `~/.local/share/lookout/run.log`.
fn log_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Some(PathBuf::from(dir).join("run.log"));
    }
    let home = dirs::home_dir()?;
    Some(home.join(".local/share/lookout/run.log"))
}

fn write_entry(path: &Path, entry: &RunLog) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;

    Ok(())
}

/// Get the current user's username.
fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
