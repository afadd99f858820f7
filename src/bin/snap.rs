//! # snap - directory snapshot manager
//!
//! Thin entry point over [`snapdir::cli`]: parses arguments, installs logging,
//! then runs the command.
//!
//! ## Usage
//! ```bash
//! snap init              # Initialize snapshot repository
//! snap save [message]    # Save current directory state
//! snap list              # List all snapshots
//! snap restore <id>      # Restore a snapshot
//! snap delete <id>       # Delete a snapshot
//! snap status            # Show snapshot statistics
//! ```

use anyhow::{anyhow, Result};
use snapdir::cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match cli::parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return ExitCode::from(code),
    };

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("snap: {:#}", e);
    }

    // Disable colors if needed
    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    ExitCode::from(cli::execute(cli))
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`, `-v` forces `debug`)
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))
}
