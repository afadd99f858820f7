//! Snapshot repository
//!
//! [`Snap`] ties the index and the snapshot directories together and
//! implements the store operations. Every operation returns a typed result;
//! rendering messages for people is left to [`crate::commands::Console`].
//!
//! ## Examples
//!
//! ```rust,no_run
//! use snapdir::{CopierKind, SnapBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snap = SnapBuilder::new()
//!     .copier(CopierKind::Native)
//!     .build("./project");
//!
//! snap.init()?;
//! let first = snap.save("first")?;
//! println!("saved {}", first.id);
//!
//! // ... edit files ...
//!
//! snap.restore(first.id)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SnapError};
use crate::index::IndexStore;
use crate::mirror::{Mirror, NativeMirror, RsyncMirror};
use crate::process::{self, ProcessRunner, SystemRunner};
use crate::snapshots::SnapshotDirs;
use crate::types::*;
use crate::usage::{DiskUsage, DuUsage, NativeUsage};
use chrono::{Local, NaiveDateTime, SubsecRound};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A snapshot store bound to a working tree
pub struct Snap {
    /// Paths and collaborator selection
    config: SnapConfig,
    /// Snapshot records
    index: IndexStore,
    /// Snapshot payload directories
    dirs: SnapshotDirs,
    /// Size measurement for `status`
    usage: Box<dyn DiskUsage>,
}

impl std::fmt::Debug for Snap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snap")
            .field("config", &self.config)
            .field("index", &self.index)
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}

impl Snap {
    /// Open the store described by `config` with system collaborators
    ///
    /// Nothing is touched on disk; the store may or may not exist yet.
    pub fn new(config: SnapConfig) -> Self {
        SnapBuilder::from_config(config).finish()
    }

    /// Configuration in use
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Working tree
    pub fn root_path(&self) -> &Path {
        &self.config.root_path
    }

    /// Store directory
    pub fn store_path(&self) -> &Path {
        &self.config.store_path
    }

    /// Snapshot directory manager
    pub fn snapshots(&self) -> &SnapshotDirs {
        &self.dirs
    }

    /// Snapshot index
    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    /// Whether `init` has been run
    pub fn is_initialized(&self) -> bool {
        self.config.store_path.is_dir()
    }

    /// Create the store directory and an empty index
    ///
    /// Running it on an existing store changes nothing.
    pub fn init(&self) -> Result<InitOutcome> {
        if self.config.store_path.exists() {
            debug!("Store already present at {:?}", self.config.store_path);
            return Ok(InitOutcome::AlreadyInitialized);
        }

        fs::create_dir_all(&self.config.store_path)
            .map_err(|e| SnapError::environment("create store directory", e))?;
        self.index.create()?;

        info!("Initialized store at {:?}", self.config.store_path);
        Ok(InitOutcome::Created)
    }

    /// Copy the working tree into a new snapshot and record it
    ///
    /// The record is appended only after the copy succeeded. A failed copy
    /// leaves its partial directory behind and the index untouched.
    pub fn save(&self, message: &str) -> Result<SnapshotRecord> {
        self.require_store()?;
        let id = self.index.next_id()?;

        if let Err(e) = self.dirs.materialize(id, &self.config.root_path) {
            if self.dirs.exists(id) {
                warn!(
                    "Copy for snapshot {} failed; partial directory left at {:?}",
                    id,
                    self.dirs.path_for(id)
                );
            }
            return Err(e);
        }

        let record = SnapshotRecord::new(id, now(), message);
        self.index.append(&record)?;

        info!("Saved snapshot {}", id);
        Ok(record)
    }

    /// All records in index order
    ///
    /// An uninitialized store has no records.
    pub fn list(&self) -> Result<Vec<SnapshotRecord>> {
        self.index.scan()?.collect()
    }

    /// Turn user input into the id of an existing snapshot
    ///
    /// # Errors
    ///
    /// - [`SnapError::NotInitialized`] if the store is missing
    /// - [`SnapError::InvalidSnapshotId`] if `text` is not a number
    /// - [`SnapError::SnapshotNotFound`] if no directory exists for it
    pub fn resolve(&self, text: &str) -> Result<SnapshotId> {
        self.require_store()?;
        let id: SnapshotId = text.parse()?;
        if !self.dirs.exists(id) {
            return Err(SnapError::SnapshotNotFound(text.trim().to_string()));
        }
        Ok(id)
    }

    /// Mirror a snapshot over the working tree
    ///
    /// Destructive: files created since the snapshot are deleted. The store
    /// directory and excluded names are left alone. The index is never
    /// modified.
    pub fn restore(&self, id: SnapshotId) -> Result<()> {
        self.require_store()?;
        self.dirs.restore(id, &self.config.root_path)?;
        info!("Restored snapshot {}", id);
        Ok(())
    }

    /// Remove a snapshot's directory, then its index record
    ///
    /// The index is read and staged before anything is removed, so an
    /// unreadable index leaves the snapshot in place. If the directory cannot
    /// be removed the index is left untouched.
    pub fn delete(&self, id: SnapshotId) -> Result<()> {
        self.require_store()?;
        if !self.dirs.exists(id) {
            return Err(SnapError::SnapshotNotFound(id.to_string()));
        }

        let rewrite = self.index.prepare_removal(id)?;
        self.dirs.destroy(id)?;
        match rewrite {
            Some(rewrite) => rewrite.commit()?,
            None => warn!("Snapshot {} had a directory but no index record", id),
        }

        info!("Deleted snapshot {}", id);
        Ok(())
    }

    /// Record count and store size
    pub fn status(&self) -> Result<StoreStatus> {
        self.require_store()?;
        let snapshot_count = self.index.count()?;
        let total_size = match self.usage.measure(&self.config.store_path) {
            Ok(size) => Some(size),
            Err(e) => {
                debug!("Store size unavailable: {}", e);
                None
            }
        };

        Ok(StoreStatus {
            store_path: self.config.store_path.clone(),
            snapshot_count,
            total_size,
        })
    }

    fn require_store(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(SnapError::NotInitialized(self.config.store_path.clone()))
        }
    }
}

/// Current local time truncated to whole seconds
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Builder for [`Snap`] with custom paths and collaborators
///
/// # Examples
///
/// ```rust
/// use snapdir::{CopierKind, SnapBuilder};
///
/// let snap = SnapBuilder::new()
///     .store_path("/tmp/project-snapshots")
///     .excludes(vec![".git".to_string(), "target".to_string()])
///     .copier(CopierKind::Native)
///     .build("/tmp/project");
/// assert_eq!(snap.config().index_path().file_name().unwrap(), "index.txt");
/// ```
pub struct SnapBuilder {
    store_path: Option<PathBuf>,
    index_file: Option<String>,
    excludes: Option<Vec<String>>,
    copier: CopierKind,
    runner: Option<Arc<dyn ProcessRunner>>,
    mirror: Option<Box<dyn Mirror>>,
    usage: Option<Box<dyn DiskUsage>>,
    config: Option<SnapConfig>,
}

impl Default for SnapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            store_path: None,
            index_file: None,
            excludes: None,
            copier: CopierKind::default(),
            runner: None,
            mirror: None,
            usage: None,
            config: None,
        }
    }

    fn from_config(config: SnapConfig) -> Self {
        let copier = config.copier;
        Self {
            copier,
            config: Some(config),
            ..Self::new()
        }
    }

    /// Store directory (defaults to `<root>/.snap`)
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Index file name inside the store (defaults to `index.txt`)
    pub fn index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = Some(name.into());
        self
    }

    /// Names excluded from every copy (defaults to `.git`)
    ///
    /// The store directory's own name is always excluded as well.
    pub fn excludes(mut self, names: Vec<String>) -> Self {
        self.excludes = Some(names);
        self
    }

    /// Select system collaborators
    pub fn copier(mut self, kind: CopierKind) -> Self {
        self.copier = kind;
        self
    }

    /// Runner used to start `rsync` and `du`
    pub fn runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Use a specific mirror implementation, bypassing `copier`
    pub fn mirror(mut self, mirror: Box<dyn Mirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Use a specific size measurement, bypassing `copier`
    pub fn disk_usage(mut self, usage: Box<dyn DiskUsage>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Build a [`Snap`] for the working tree at `root_path`
    pub fn build(mut self, root_path: impl Into<PathBuf>) -> Snap {
        let mut config = SnapConfig::new(root_path);
        if let Some(store_path) = self.store_path.take() {
            config.store_path = store_path;
        }
        if let Some(index_file) = self.index_file.take() {
            config.index_file = index_file;
        }
        if let Some(excludes) = self.excludes.take() {
            config.excludes = excludes;
        }
        config.copier = self.copier;
        self.config = Some(config);
        self.finish()
    }

    fn finish(self) -> Snap {
        let config = self
            .config
            .unwrap_or_else(|| SnapConfig::new("."));
        let runner = self.runner.unwrap_or_else(|| Arc::new(SystemRunner));

        let use_rsync = || match config.copier {
            CopierKind::Rsync => true,
            CopierKind::Native => false,
            CopierKind::Auto => {
                let found = process::probe(runner.as_ref(), RsyncMirror::PROGRAM);
                debug!("rsync {}", if found { "found" } else { "not found, using native copy" });
                found
            }
        };

        let (mirror, usage) = match (self.mirror, self.usage) {
            (Some(mirror), Some(usage)) => (mirror, usage),
            (mirror, usage) => {
                let rsync = use_rsync();
                let mirror = mirror.unwrap_or_else(|| -> Box<dyn Mirror> {
                    if rsync {
                        Box::new(RsyncMirror::new(runner.clone()))
                    } else {
                        Box::new(NativeMirror)
                    }
                });
                let usage = usage.unwrap_or_else(|| -> Box<dyn DiskUsage> {
                    if rsync {
                        Box::new(DuUsage::new(runner.clone()))
                    } else {
                        Box::new(NativeUsage)
                    }
                });
                (mirror, usage)
            }
        };

        let index = IndexStore::new(config.index_path());
        let dirs = SnapshotDirs::new(
            config.store_path.clone(),
            config.effective_excludes(),
            mirror,
        );

        Snap {
            config,
            index,
            dirs,
            usage,
        }
    }
}
