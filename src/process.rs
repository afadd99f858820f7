//! External process execution
//!
//! Every external program snapdir relies on (`rsync`, `du`) is started
//! through [`ProcessRunner`], so the collaborators built on top of it can be
//! exercised with a scripted runner in tests.

use crate::error::{Result, SnapError};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::process::Command;
use tracing::debug;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Capability to run a program to completion
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, blocking until it exits
    ///
    /// A program that cannot be found must be reported as
    /// [`SnapError::ToolUnavailable`]; a nonzero exit is not an error here.
    fn run(&self, program: &str, args: &[OsString]) -> Result<ProcessOutput>;
}

/// Runs programs with [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ProcessOutput> {
        debug!("Running {} {:?}", program, args);
        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SnapError::ToolUnavailable(program.to_string())
            } else {
                SnapError::environment(format!("run {}", program), e)
            }
        })?;

        let result = ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("{} exited with {:?}", program, result.status);
        Ok(result)
    }
}

/// Whether `program --version` runs successfully
pub fn probe(runner: &dyn ProcessRunner, program: &str) -> bool {
    runner
        .run(program, &[OsString::from("--version")])
        .map(|out| out.success())
        .unwrap_or(false)
}
