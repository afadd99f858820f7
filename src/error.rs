//! Error types for snapdir
//!
//! Errors fall into three groups, and the console renders each group
//! differently:
//!
//! - **Fatal environment errors** (the store or index cannot be created,
//!   written or renamed). These abort the process.
//! - **User errors** (store not initialized, unknown snapshot id). These print a
//!   message and leave everything untouched.
//! - **External tool failures** (the copy utility exits nonzero or is missing).
//!   These print a message and never mutate the index.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in snapdir
pub type Result<T> = std::result::Result<T, SnapError>;

/// Main error type for all snapdir operations
#[derive(Debug, Error)]
pub enum SnapError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error with the operation that caused it
    #[error("{context}: {source}")]
    Environment {
        /// What was being attempted
        context: String,
        /// Underlying system error
        #[source]
        source: std::io::Error,
    },

    /// Errors during JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Store directory does not exist
    #[error("Store not initialized at path: {0:?}")]
    NotInitialized(PathBuf),

    /// No snapshot directory for this id
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// Text that is not a snapshot id
    #[error("Invalid snapshot id: {0:?}")]
    InvalidSnapshotId(String),

    /// Every snapshot id up to the maximum has been used
    #[error("Snapshot ids exhausted after {0}")]
    IdsExhausted(crate::types::SnapshotId),

    /// Index line that cannot be decoded
    #[error("Malformed index record: {0}")]
    MalformedRecord(String),

    /// An external collaborator (copy or measurement) reported failure
    #[error("{tool} failed: {reason}")]
    ToolFailed {
        /// Collaborator name (`rsync`, `du`, `native copy`)
        tool: String,
        /// Exit status and error output, or the underlying error
        reason: String,
    },

    /// External program could not be started
    #[error("{0} is not available")]
    ToolUnavailable(String),

    /// Snapshot directory could not be removed
    #[error("Failed to delete snapshot directory {path:?}: {source}")]
    DeleteFailed {
        /// Directory that was being removed
        path: PathBuf,
        /// Underlying system error
        #[source]
        source: std::io::Error,
    },
}

impl SnapError {
    /// Wrap an I/O error with the operation that produced it
    pub fn environment(context: impl Into<String>, source: std::io::Error) -> Self {
        SnapError::Environment {
            context: context.into(),
            source,
        }
    }

    /// Create a collaborator failure
    pub fn tool_failed(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        SnapError::ToolFailed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error means the environment is broken
    ///
    /// Fatal errors abort the process; everything else is reported to the user
    /// and the command returns without side effects.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SnapError::Io(_)
                | SnapError::Environment { .. }
                | SnapError::Json(_)
                | SnapError::WalkDir(_)
        )
    }

    /// Check if this error came from an external collaborator
    pub fn is_external(&self) -> bool {
        matches!(self, SnapError::ToolFailed { .. } | SnapError::ToolUnavailable(_))
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            SnapError::NotInitialized(_) => "not initialized (run `snap init`)".to_string(),
            SnapError::SnapshotNotFound(id) => format!("snapshot '{}' not found", id),
            SnapError::InvalidSnapshotId(id) => {
                format!("snapshot '{}' not found (ids are numbers such as 0001)", id)
            }
            SnapError::IdsExhausted(last) => {
                format!("no snapshot ids left after {}; delete the store to start over", last)
            }
            SnapError::DeleteFailed { .. } => "failed to delete snapshot directory".to_string(),
            SnapError::ToolUnavailable(tool) => {
                format!("{} is not installed; retry with `--copier native`", tool)
            }
            _ => self.to_string(),
        }
    }
}
