//! CLI argument definitions for Lookout.

use clap::{Parser, Subcommand};

/// Lookout - a read-only observer for a node tracking service.
///
/// Observes, proposes, and never applies: fetches the current snapshot,
/// analyzes it, and prints an observer report. With `--save` the report is
/// persisted to the tracker and read back to verify it landed unchanged.
#[derive(Parser, Debug)]
#[command(name = "lkt")]
#[command(author, version, about = "Observe a node tracker and report what to do next", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Base URL of the tracker service. Can also be set via LOOKOUT_BASE_URL.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Save the report to the tracker and verify it was stored unchanged
    #[arg(long)]
    pub save: bool,

    /// Treat a report with warnings as a failure (non-zero exit)
    #[arg(long)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands. With no subcommand, one observation runs.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show build information
    BuildInfo,
}

/// Package version from Cargo metadata.
pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Short git commit hash the binary was built from.
pub fn git_commit() -> &'static str {
    env!("LKT_GIT_COMMIT")
}

/// ISO 8601 timestamp of the build.
pub fn build_timestamp() -> &'static str {
    env!("LKT_BUILD_TIMESTAMP")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_observe_flags() {
        let cli = Cli::try_parse_from(["lkt", "--save", "--strict", "-H"]).unwrap();
        assert!(cli.save);
        assert!(cli.strict);
        assert!(cli.human_readable);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_base_url_flag() {
        let cli = Cli::try_parse_from(["lkt", "--base-url", "http://localhost:4000"]).unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:4000"));
    }

    #[test]
    fn test_build_info_subcommand() {
        let cli = Cli::try_parse_from(["lkt", "build-info"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::BuildInfo)));
    }
}
