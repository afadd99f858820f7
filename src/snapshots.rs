//! Snapshot directories
//!
//! Each snapshot's payload is a plain directory inside the store, named by
//! its zero-padded id:
//!
//! ```text
//! .snap/
//! ├── index.txt
//! ├── last_id
//! ├── 0001/      # full copy of the tree at save time
//! └── 0002/
//! ```

use crate::error::{Result, SnapError};
use crate::mirror::Mirror;
use crate::types::SnapshotId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Creates, locates and destroys snapshot directories under a store root
pub struct SnapshotDirs {
    /// Store directory
    root: PathBuf,
    /// Names skipped by every copy
    excludes: Vec<String>,
    /// Copy collaborator
    mirror: Box<dyn Mirror>,
}

impl std::fmt::Debug for SnapshotDirs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotDirs")
            .field("root", &self.root)
            .field("excludes", &self.excludes)
            .field("mirror", &self.mirror.name())
            .finish()
    }
}

impl SnapshotDirs {
    /// Manage snapshot directories under `root`
    pub fn new(root: PathBuf, excludes: Vec<String>, mirror: Box<dyn Mirror>) -> Self {
        Self {
            root,
            excludes,
            mirror,
        }
    }

    /// Name of the copy collaborator in use
    pub fn mirror_name(&self) -> &str {
        self.mirror.name()
    }

    /// Directory for `id`
    pub fn path_for(&self, id: SnapshotId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Whether a directory exists for `id`
    pub fn exists(&self, id: SnapshotId) -> bool {
        self.path_for(id).is_dir()
    }

    /// Mirror `source_root` into the directory for `id`
    ///
    /// On failure the directory may be left partially written.
    pub fn materialize(&self, id: SnapshotId, source_root: &Path) -> Result<PathBuf> {
        let target = self.path_for(id);
        debug!("Materializing snapshot {} from {:?}", id, source_root);
        self.mirror.mirror(source_root, &target, &self.excludes)?;
        Ok(target)
    }

    /// Mirror the directory for `id` over `destination_root`
    ///
    /// Anything in the destination that is not in the snapshot is deleted,
    /// except excluded names.
    pub fn restore(&self, id: SnapshotId, destination_root: &Path) -> Result<()> {
        if !self.exists(id) {
            return Err(SnapError::SnapshotNotFound(id.to_string()));
        }
        debug!("Restoring snapshot {} into {:?}", id, destination_root);
        self.mirror.mirror(&self.path_for(id), destination_root, &self.excludes)
    }

    /// Recursively remove the directory for `id`
    pub fn destroy(&self, id: SnapshotId) -> Result<()> {
        let path = self.path_for(id);
        fs::remove_dir_all(&path).map_err(|source| SnapError::DeleteFailed {
            path: path.clone(),
            source,
        })?;
        info!("Removed snapshot directory {:?}", path);
        Ok(())
    }
}
