//! Utility functions for snapdir
//!
//! Small filesystem helpers shared by the index and the in-process
//! collaborators: atomic writes, exclusion matching, path manipulation,
//! byte formatting and symlink handling.

use crate::error::{Result, SnapError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::trace;

/// Atomic file write (write to temp file then rename)
///
/// The temporary file is created next to `path` so the final rename never
/// crosses a filesystem boundary. Either the whole content is visible under
/// `path` or the previous file is left untouched.
///
/// # Errors
///
/// - [`SnapError::Io`] if the temporary file cannot be created or written
/// - [`SnapError::Environment`] if the rename fails
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.flush()?;
    persist(temp, path)
}

/// Rename a finished temporary file over `path`
pub fn persist(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.persist(path)
        .map_err(|e| SnapError::environment(format!("replace {}", path.display()), e.error))?;
    trace!("Replaced {:?}", path);
    Ok(())
}

/// Directory that holds `path`, `.` for bare file names
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check whether a directory entry name is excluded from mirroring
///
/// Names match any path component at any depth, the way an unanchored
/// `rsync --exclude NAME` does.
pub fn is_excluded(name: &std::ffi::OsStr, excludes: &[String]) -> bool {
    excludes.iter().any(|ex| name == ex.as_str())
}

/// Make a path relative to a base path
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .map_err(|_| {
            SnapError::environment(
                format!("walk {}", base.display()),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{:?} is not under {:?}", path, base),
                ),
            )
        })
}

/// Remove whatever is at `path`: file, symlink or directory tree
pub fn remove_entry(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Format bytes in human-readable form
///
/// Uses binary units (1024-based). Values under 1 KB are whole numbers,
/// everything larger gets two decimals.
///
/// ```rust,ignore
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Create a symbolic link (Unix)
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

/// Create a symbolic link (Windows)
#[cfg(windows)]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)?;
    } else {
        std::os::windows::fs::symlink_file(target, link)?;
    }
    Ok(())
}
