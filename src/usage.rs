//! Disk usage measurement for `status`
//!
//! Measurement is best effort: callers treat any error as "size unknown".

use crate::error::{Result, SnapError};
use crate::process::ProcessRunner;
use crate::utils::format_bytes;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// Capability to report the size of a directory tree
pub trait DiskUsage: Send + Sync {
    /// Human-readable aggregate size of everything under `path`
    fn measure(&self, path: &Path) -> Result<String>;
}

/// Size as reported by `du -sh`
#[derive(Clone)]
pub struct DuUsage {
    runner: Arc<dyn ProcessRunner>,
}

impl DuUsage {
    /// Program name looked up on `PATH`
    pub const PROGRAM: &'static str = "du";

    /// Create a measurement that starts `du` with `runner`
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

impl std::fmt::Debug for DuUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuUsage").finish_non_exhaustive()
    }
}

impl DiskUsage for DuUsage {
    fn measure(&self, path: &Path) -> Result<String> {
        let args = [OsString::from("-sh"), path.as_os_str().to_os_string()];
        let output = self.runner.run(Self::PROGRAM, &args)?;
        if !output.success() {
            return Err(SnapError::tool_failed(Self::PROGRAM, output.stderr.trim()));
        }

        // `du -sh DIR` prints "<size>\t<DIR>"
        output
            .stdout
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| SnapError::tool_failed(Self::PROGRAM, "empty output"))
    }
}

/// Sum of file sizes, computed in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeUsage;

impl DiskUsage for NativeUsage {
    fn measure(&self, path: &Path) -> Result<String> {
        let mut total = 0u64;
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file() {
                total += entry.metadata()?.len();
            }
        }
        Ok(format_bytes(total))
    }
}
