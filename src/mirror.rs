//! Mirror copies
//!
//! A mirror makes the destination an exact replica of the source: entries are
//! copied over, and entries present only in the destination are deleted.
//! Excluded names are skipped on both sides, so they are neither copied nor
//! deleted.
//!
//! Two implementations are provided:
//!
//! - [`RsyncMirror`] runs `rsync -a --delete` through a [`ProcessRunner`]
//! - [`NativeMirror`] walks both trees in-process with `walkdir`

use crate::error::{Result, SnapError};
use crate::process::ProcessRunner;
use crate::utils;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Recursive mirror-copy capability
pub trait Mirror: Send + Sync {
    /// Short name used in messages and logs
    fn name(&self) -> &str;

    /// Make `destination` an exact copy of `source`, ignoring `excludes`
    ///
    /// `destination` is created if missing; its parent must exist.
    fn mirror(&self, source: &Path, destination: &Path, excludes: &[String]) -> Result<()>;
}

/// Mirror through the external `rsync` utility
#[derive(Clone)]
pub struct RsyncMirror {
    runner: Arc<dyn ProcessRunner>,
}

impl RsyncMirror {
    /// Program name looked up on `PATH`
    pub const PROGRAM: &'static str = "rsync";

    /// Create a mirror that starts `rsync` with `runner`
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Arguments for one mirror run
    pub fn arguments(source: &Path, destination: &Path, excludes: &[String]) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-a".into(), "--delete".into()];
        for name in excludes {
            args.push("--exclude".into());
            args.push(name.into());
        }

        // Trailing slash: copy the contents of source, not source itself
        let mut source_arg = source.as_os_str().to_os_string();
        if !source_arg.to_string_lossy().ends_with('/') {
            source_arg.push("/");
        }
        args.push(source_arg);
        args.push(destination.as_os_str().to_os_string());
        args
    }
}

impl std::fmt::Debug for RsyncMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsyncMirror").finish_non_exhaustive()
    }
}

impl Mirror for RsyncMirror {
    fn name(&self) -> &str {
        Self::PROGRAM
    }

    fn mirror(&self, source: &Path, destination: &Path, excludes: &[String]) -> Result<()> {
        let args = Self::arguments(source, destination, excludes);
        debug!("Mirroring {:?} -> {:?} with rsync", source, destination);

        let output = self.runner.run(Self::PROGRAM, &args)?;
        if output.success() {
            return Ok(());
        }

        let status = match output.status {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = output.stderr.trim();
        let reason = if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        };
        Err(SnapError::tool_failed(Self::PROGRAM, reason))
    }
}

/// In-process mirror built on `walkdir`
///
/// Regular files are copied with [`fs::copy`], which keeps permission bits.
/// Symlinks are recreated rather than followed. An entry whose type differs
/// between the trees is replaced. Special files (FIFOs, sockets, devices) are
/// never opened: they are skipped with a warning when copying and left in
/// place when pruning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMirror;

impl NativeMirror {
    /// Copy every non-excluded source entry into the destination
    fn copy_tree(&self, source: &Path, destination: &Path, excludes: &[String]) -> Result<()> {
        let walker = WalkDir::new(source)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !utils::is_excluded(e.file_name(), excludes));

        for entry in walker {
            let entry = entry?;
            let relative = utils::make_relative(entry.path(), source)?;
            let target = destination.join(&relative);
            let existing = fs::symlink_metadata(&target).ok();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if existing.is_some_and(|m| !m.is_dir()) {
                    utils::remove_entry(&target)?;
                }
                fs::create_dir_all(&target)?;
            } else if file_type.is_symlink() || file_type.is_file() {
                // Replace rather than overwrite so read-only targets and
                // type changes behave the same
                if existing.is_some() {
                    utils::remove_entry(&target)?;
                }
                if file_type.is_symlink() {
                    let link = fs::read_link(entry.path())?;
                    utils::create_symlink(&link, &target)?;
                } else {
                    fs::copy(entry.path(), &target)?;
                }
            } else {
                warn!("Skipping special file {:?}", relative);
                continue;
            }
            trace!("Copied {:?}", relative);
        }
        Ok(())
    }

    /// Delete destination entries that have no counterpart in the source
    fn prune(&self, source: &Path, destination: &Path, excludes: &[String]) -> Result<()> {
        let walker = WalkDir::new(destination)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .filter_entry(|e| !utils::is_excluded(e.file_name(), excludes));

        for entry in walker {
            let entry = entry?;
            let relative = utils::make_relative(entry.path(), destination)?;
            if fs::symlink_metadata(source.join(&relative)).is_ok() {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                // Children were visited first; an excluded child keeps it alive
                if let Err(e) = fs::remove_dir(entry.path()) {
                    debug!("Keeping directory {:?}: {}", relative, e);
                    continue;
                }
            } else if file_type.is_symlink() || file_type.is_file() {
                fs::remove_file(entry.path())?;
            } else {
                debug!("Keeping special file {:?}", relative);
                continue;
            }
            trace!("Deleted {:?}", relative);
        }
        Ok(())
    }
}

impl Mirror for NativeMirror {
    fn name(&self) -> &str {
        "native copy"
    }

    fn mirror(&self, source: &Path, destination: &Path, excludes: &[String]) -> Result<()> {
        debug!("Mirroring {:?} -> {:?} in-process", source, destination);
        if !source.is_dir() {
            return Err(SnapError::tool_failed(
                self.name(),
                format!("{} is not a directory", source.display()),
            ));
        }

        let result = fs::create_dir_all(destination)
            .map_err(SnapError::from)
            .and_then(|_| self.copy_tree(source, destination, excludes))
            .and_then(|_| self.prune(source, destination, excludes));

        result.map_err(|e| SnapError::tool_failed(self.name(), e.to_string()))
    }
}
