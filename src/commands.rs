//! Console rendering of snapshot commands
//!
//! [`Console`] runs one [`Snap`] operation per call and turns its result into
//! the lines a user sees. User errors and tool failures become a `snap: ...`
//! line and [`CommandStatus::Failed`]; fatal environment errors are returned
//! to the caller untouched.

use crate::error::{Result, SnapError};
use crate::repository::Snap;
use crate::types::{InitOutcome, SnapshotRecord};
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command did what was asked (including idempotent no-ops)
    Success,
    /// A message was printed and nothing was changed
    Failed,
}

impl CommandStatus {
    /// Process exit code for this status
    pub fn exit_code(self) -> u8 {
        match self {
            CommandStatus::Success => crate::cli::EXIT_SUCCESS,
            CommandStatus::Failed => crate::cli::EXIT_FAILURE,
        }
    }
}

/// Writes command results for people (or JSON for scripts) to `out`
pub struct Console<W: Write> {
    snap: Snap,
    out: W,
    show_timing: bool,
}

impl<W: Write> Console<W> {
    /// Render results of `snap` operations to `out`
    pub fn new(snap: Snap, out: W) -> Self {
        Self {
            snap,
            out,
            show_timing: true,
        }
    }

    /// Print the elapsed time after `save` (on by default)
    pub fn show_timing(mut self, enabled: bool) -> Self {
        self.show_timing = enabled;
        self
    }

    /// Repository behind this console
    pub fn snap(&self) -> &Snap {
        &self.snap
    }

    /// Give back the output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// `snap init`
    pub fn init(&mut self) -> Result<CommandStatus> {
        match self.snap.init() {
            Ok(InitOutcome::Created) => {
                let path = self.snap.store_path().display().to_string();
                writeln!(self.out, "Initialized snap repository in {}", path.cyan())?;
                Ok(CommandStatus::Success)
            }
            Ok(InitOutcome::AlreadyInitialized) => {
                writeln!(self.out, "{} already initialized", "snap:".yellow())?;
                Ok(CommandStatus::Success)
            }
            Err(e) => self.report(e, None),
        }
    }

    /// `snap save [message]`
    pub fn save(&mut self, message: &str, show_progress: bool) -> Result<CommandStatus> {
        let start = Instant::now();
        let spinner = show_progress.then(|| spinner("Copying files..."));
        let result = self.snap.save(message);
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        match result {
            Ok(record) => {
                writeln!(
                    self.out,
                    "Saved snapshot {}",
                    record.id.to_string().green().bold()
                )?;
                if self.show_timing {
                    let elapsed = Duration::from_millis(start.elapsed().as_millis() as u64);
                    writeln!(
                        self.out,
                        "  Time: {}",
                        format_duration(elapsed).to_string().dimmed()
                    )?;
                }
                Ok(CommandStatus::Success)
            }
            Err(e) => self.report(e, Some("copy failed")),
        }
    }

    /// `snap list [--json]`
    pub fn list(&mut self, json: bool) -> Result<CommandStatus> {
        let records = match self.snap.list() {
            Ok(records) => records,
            Err(e) => return self.report(e, None),
        };

        if json {
            let rendered = serde_json::to_string_pretty(&records)?;
            writeln!(self.out, "{}", rendered)?;
            return Ok(CommandStatus::Success);
        }

        if records.is_empty() {
            writeln!(self.out, "{} no snapshots", "snap:".yellow())?;
            return Ok(CommandStatus::Success);
        }

        writeln!(self.out, "{}", "ID     Timestamp             Message".bold())?;
        writeln!(
            self.out,
            "-----  --------------------  ----------------------------"
        )?;
        for record in &records {
            self.write_row(record)?;
        }
        Ok(CommandStatus::Success)
    }

    fn write_row(&mut self, record: &SnapshotRecord) -> Result<()> {
        // Keep each record on one table row
        let message = record.message.lines().collect::<Vec<_>>().join(" ");
        writeln!(
            self.out,
            "{}  {}  {}",
            format!("{:<5}", record.id.to_string()).yellow(),
            format!("{:<20}", record.timestamp_string()).dimmed(),
            message
        )?;
        Ok(())
    }

    /// `snap restore <id>`
    pub fn restore(&mut self, id: &str, show_progress: bool) -> Result<CommandStatus> {
        let id = match self.snap.resolve(id) {
            Ok(id) => id,
            Err(e) => return self.report(e, None),
        };

        writeln!(self.out, "Restoring snapshot {}...", id.to_string().yellow())?;
        let spinner = show_progress.then(|| spinner("Restoring files..."));
        let result = self.snap.restore(id);
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        match result {
            Ok(()) => {
                writeln!(self.out, "Restored snapshot {}", id.to_string().green().bold())?;
                Ok(CommandStatus::Success)
            }
            Err(e) => self.report(e, Some("restore failed")),
        }
    }

    /// `snap delete <id>`
    pub fn delete(&mut self, id: &str) -> Result<CommandStatus> {
        let result = self.snap.resolve(id).and_then(|id| {
            self.snap.delete(id)?;
            Ok(id)
        });

        match result {
            Ok(id) => {
                writeln!(self.out, "Deleted snapshot {}", id.to_string().green().bold())?;
                Ok(CommandStatus::Success)
            }
            Err(e) => self.report(e, None),
        }
    }

    /// `snap status [--json]`
    pub fn status(&mut self, json: bool) -> Result<CommandStatus> {
        let status = match self.snap.status() {
            Ok(status) => status,
            Err(e) => return self.report(e, None),
        };

        if json {
            let rendered = serde_json::to_string_pretty(&status)?;
            writeln!(self.out, "{}", rendered)?;
            return Ok(CommandStatus::Success);
        }

        if !self.snap.index().exists() {
            writeln!(self.out, "No snapshots")?;
            return Ok(CommandStatus::Success);
        }

        writeln!(
            self.out,
            "Total snapshots: {}",
            status.snapshot_count.to_string().cyan()
        )?;
        if let Some(size) = &status.total_size {
            writeln!(self.out, "Total size: {}", size.cyan())?;
        }
        Ok(CommandStatus::Success)
    }

    /// Print a non-fatal error, or hand a fatal one back to the caller
    fn report(&mut self, err: SnapError, context: Option<&str>) -> Result<CommandStatus> {
        if err.is_fatal() {
            return Err(err);
        }

        let message = match context {
            Some(context) if err.is_external() => format!("{}: {}", context, err.user_message()),
            _ => err.user_message(),
        };
        writeln!(self.out, "{} {}", "snap:".red().bold(), message)?;
        Ok(CommandStatus::Failed)
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
