//! Core data types used throughout snapdir
//!
//! ## Overview
//!
//! - **Identity**: [`SnapshotId`] - the sequential, zero-padded snapshot number
//! - **Index**: [`SnapshotRecord`] - one line of the index file
//! - **Configuration**: [`SnapConfig`], [`CopierKind`] - paths and collaborators
//! - **Results**: [`InitOutcome`], [`StoreStatus`] - what commands report back
//!
//! ## Examples
//!
//! ```rust
//! use snapdir::types::SnapshotId;
//!
//! let id: SnapshotId = "7".parse().unwrap();
//! assert_eq!(id.to_string(), "0007");
//! assert_eq!(id, "0007".parse::<SnapshotId>().unwrap());
//! ```

use crate::error::SnapError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Minimum number of digits in a rendered snapshot id
pub const ID_WIDTH: usize = 4;

/// Format of record timestamps, second precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default name of the store directory inside the tracked root
pub const DEFAULT_STORE_DIR: &str = ".snap";

/// Default name of the index file inside the store
pub const DEFAULT_INDEX_FILE: &str = "index.txt";

/// Sequential snapshot identifier
///
/// Always positive. Rendered zero-padded to [`ID_WIDTH`] digits, which is also
/// the name of the snapshot's directory inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u32);

impl SnapshotId {
    /// The first id handed out in an empty store
    pub const FIRST: SnapshotId = SnapshotId(1);

    /// Create an id from its number, rejecting zero
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(SnapshotId(value))
    }

    /// Numeric value of the id
    pub fn get(self) -> u32 {
        self.0
    }

    /// The id that follows this one, `None` once the id space is used up
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(SnapshotId)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = ID_WIDTH)
    }
}

impl FromStr for SnapshotId {
    type Err = SnapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SnapError::InvalidSnapshotId(s.to_string()));
        }
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(SnapshotId::new)
            .ok_or_else(|| SnapError::InvalidSnapshotId(s.to_string()))
    }
}

impl Serialize for SnapshotId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One entry of the snapshot index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRecord {
    /// Snapshot id, also the directory name
    pub id: SnapshotId,
    /// Local creation time, `None` for hand-edited lines without a valid one
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: Option<NaiveDateTime>,
    /// User-supplied message, possibly empty
    pub message: String,
}

impl SnapshotRecord {
    /// Create a record
    pub fn new(id: SnapshotId, timestamp: NaiveDateTime, message: impl Into<String>) -> Self {
        Self {
            id,
            timestamp: Some(timestamp),
            message: message.into(),
        }
    }

    /// Timestamp rendered in the index format, empty when unknown
    pub fn timestamp_string(&self) -> String {
        self.timestamp
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }
}

fn serialize_timestamp<S: Serializer>(
    ts: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.collect_str(&ts.format(TIMESTAMP_FORMAT)),
        None => serializer.serialize_none(),
    }
}

/// Which mirror-copy and disk-usage collaborators to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopierKind {
    /// `rsync` and `du` when `rsync` is installed, in-process otherwise
    #[default]
    Auto,
    /// Always shell out to `rsync` and `du`
    Rsync,
    /// In-process recursive copy and size walk
    Native,
}

/// Configuration for a snapshot store
///
/// All paths are explicit so that tests can point each store at its own
/// temporary directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Working tree that gets snapshotted and restored
    pub root_path: PathBuf,
    /// Store directory holding the index and snapshot directories
    pub store_path: PathBuf,
    /// File name of the index inside the store
    pub index_file: String,
    /// Entry names never copied into or deleted by a mirror
    pub excludes: Vec<String>,
    /// Collaborator selection
    pub copier: CopierKind,
}

impl SnapConfig {
    /// Configuration with the default `.snap` store inside `root_path`
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let root_path = root_path.into();
        Self {
            store_path: root_path.join(DEFAULT_STORE_DIR),
            root_path,
            index_file: DEFAULT_INDEX_FILE.to_string(),
            excludes: vec![".git".to_string()],
            copier: CopierKind::Auto,
        }
    }

    /// Path of the index file
    pub fn index_path(&self) -> PathBuf {
        self.store_path.join(&self.index_file)
    }

    /// Exclusion names including the store directory itself
    pub fn effective_excludes(&self) -> Vec<String> {
        let mut excludes = Vec::with_capacity(self.excludes.len() + 1);
        if let Some(name) = self.store_path.file_name() {
            excludes.push(name.to_string_lossy().into_owned());
        }
        for name in &self.excludes {
            if !excludes.contains(name) {
                excludes.push(name.clone());
            }
        }
        excludes
    }
}

/// Result of `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Store and empty index were created
    Created,
    /// Store already existed; nothing changed
    AlreadyInitialized,
}

/// Aggregate statistics reported by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    /// Store location
    pub store_path: PathBuf,
    /// Records currently in the index
    pub snapshot_count: usize,
    /// Human-readable size of the store, when measurable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<String>,
}
