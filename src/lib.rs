//! Lookout - a read-only observer for a node tracking service.
//!
//! This library provides the core functionality for the `lkt` CLI tool:
//! fetching a snapshot of tracked nodes, deriving analytical signals
//! (cooling detection, status proposals, a single suggested next action),
//! and assembling an immutable observer report. It never mutates tracked
//! state; the only writes it performs are its own report log and a local
//! invocation log.

pub mod analysis;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod run_log;

/// Library-level error type for Lookout operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Api(#[from] api::ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("healthcheck failed: {0}")]
    IntegrityCheck(String),

    #[error("report has {count} warning(s) and --strict is set")]
    StrictWarnings { count: usize },
}

/// Result type alias for Lookout operations.
pub type Result<T> = std::result::Result<T, Error>;
