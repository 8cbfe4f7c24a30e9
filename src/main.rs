//! Lookout CLI - a read-only observer for a node tracking service.

use clap::Parser;
use lookout::cli::{Cli, Commands};
use lookout::config::ObserverConfig;
use lookout::{commands, run_log};
use std::process;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    if let Some(Commands::BuildInfo) = cli.command {
        if human {
            println!("Version: {}", lookout::cli::package_version());
            println!("Commit:  {}", lookout::cli::git_commit());
            println!("Built:   {}", lookout::cli::build_timestamp());
        } else {
            let result = serde_json::json!({
                "version": lookout::cli::package_version(),
                "commit": lookout::cli::git_commit(),
                "built": lookout::cli::build_timestamp(),
            });
            println!("{}", result);
        }
        return;
    }

    // Resolve the configuration once; everything downstream takes it by
    // reference and never consults the environment again.
    let config = match ObserverConfig::resolve(cli.base_url.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            print_error(&e, human);
            process::exit(1);
        }
    };

    // Start timing
    let start = Instant::now();

    let result = commands::observe(&config, cli.save, cli.strict, human);

    let duration = start.elapsed().as_millis() as u64;
    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Log the run (silently does nothing if logging is disabled or fails)
    run_log::log_run("observe", config.base_url(), success, error, duration);

    if let Err(e) = result {
        print_error(&e, human);
        process::exit(1);
    }
}

/// Print a fatal error in the selected output format.
fn print_error(error: &lookout::Error, human: bool) {
    if human {
        eprintln!("Error: {}", error);
    } else {
        eprintln!("{}", serde_json::json!({ "error": error.to_string() }));
    }
}
