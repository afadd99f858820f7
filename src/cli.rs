//! Command-line interface
//!
//! ## Usage
//! ```bash
//! # Create the store in the current directory
//! snap init
//!
//! # Save the current state
//! snap save "before refactor"
//!
//! # Show saved snapshots
//! snap list
//!
//! # Put the tree back the way it was
//! snap restore 0001
//! ```

use crate::commands::{CommandStatus, Console};
use crate::error::Result;
use crate::repository::{Snap, SnapBuilder};
use crate::types::CopierKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use colored::*;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

/// snap - directory snapshot manager
#[derive(Debug, Parser)]
#[command(name = "snap")]
#[command(version)]
#[command(about = "Save, list and restore full copies of a directory")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory to snapshot (defaults to current)
    #[arg(short, long, global = true)]
    pub path: Option<PathBuf>,

    /// Store directory (defaults to <path>/.snap)
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// How files are copied and measured
    #[arg(long, value_enum, global = true, default_value = "auto")]
    pub copier: CopierMode,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize snapshot repository
    Init,

    /// Save current directory state
    Save {
        /// Snapshot message
        #[arg(allow_hyphen_values = true)]
        message: Option<String>,

        /// Show progress
        #[arg(long)]
        progress: bool,
    },

    /// List all snapshots
    #[command(alias = "ls")]
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore a snapshot
    Restore {
        /// Snapshot id, e.g. 0001 or 1
        id: String,

        /// Show progress
        #[arg(long)]
        progress: bool,
    },

    /// Delete a snapshot
    #[command(alias = "rm")]
    Delete {
        /// Snapshot id, e.g. 0001 or 1
        id: String,
    },

    /// Show snapshot statistics
    Status {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Copier selection on the command line
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum CopierMode {
    /// rsync when installed, built-in copy otherwise
    Auto,
    /// Always rsync and du
    Rsync,
    /// Built-in copy and size walk
    Native,
}

impl From<CopierMode> for CopierKind {
    fn from(mode: CopierMode) -> Self {
        match mode {
            CopierMode::Auto => CopierKind::Auto,
            CopierMode::Rsync => CopierKind::Rsync,
            CopierMode::Native => CopierKind::Native,
        }
    }
}

/// Exit code for success, help and version
pub const EXIT_SUCCESS: u8 = 0;

/// Exit code for usage, user, tool and environment failures
pub const EXIT_FAILURE: u8 = 1;

/// Parse arguments, printing help, version or usage errors
///
/// Returns the exit code to stop with when there is nothing to execute:
/// success for `--help` and `--version`, failure for anything unparsable.
pub fn parse_from<I, T>(args: I) -> std::result::Result<Cli, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(e) => {
            let _ = e.print();
            if e.use_stderr() {
                Err(EXIT_FAILURE)
            } else {
                Err(EXIT_SUCCESS)
            }
        }
    }
}

/// Run a parsed command line to completion, returning the exit code
pub fn execute(cli: Cli) -> u8 {
    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return EXIT_FAILURE;
    };

    let root_path = cli.path.unwrap_or_else(|| PathBuf::from("."));
    let mut builder = SnapBuilder::new().copier(cli.copier.into());
    if let Some(store) = cli.store {
        builder = builder.store_path(store);
    }
    let snap = builder.build(root_path);
    debug!("Using {:?}", snap);

    let stdout = std::io::stdout();
    match dispatch(snap, stdout.lock(), command) {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("{} {}", "snap:".red().bold(), e);
            EXIT_FAILURE
        }
    }
}

/// Parse and execute in one step
pub fn run<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match parse_from(args) {
        Ok(cli) => execute(cli),
        Err(code) => code,
    }
}

fn dispatch<W: std::io::Write>(snap: Snap, out: W, command: Commands) -> Result<CommandStatus> {
    let mut console = Console::new(snap, out);
    match command {
        Commands::Init => console.init(),
        Commands::Save { message, progress } => {
            console.save(message.as_deref().unwrap_or(""), progress)
        }
        Commands::List { json } => console.list(json),
        Commands::Restore { id, progress } => console.restore(&id, progress),
        Commands::Delete { id } => console.delete(&id),
        Commands::Status { json } => console.status(json),
    }
}
