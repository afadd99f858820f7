//! # snapdir - Point-in-time directory snapshots
//!
//! A small snapshot manager: every snapshot is a full mirrored copy of a
//! working tree, kept in a hidden store next to a plain-text index.
//!
//! ## Overview
//!
//! snapdir lets you:
//! - Initialize a store (`.snap/` by default) inside a directory
//! - Save the whole tree as a numbered snapshot (`0001`, `0002`, ...)
//! - List snapshots with their timestamp and message
//! - Restore the tree to exactly the state of a snapshot
//! - Delete snapshots and report aggregate statistics
//!
//! ## Architecture
//!
//! - **Index**: [`index::IndexStore`] keeps one `id | timestamp | message`
//!   line per snapshot, with escape-safe messages
//! - **Snapshot directories**: [`snapshots::SnapshotDirs`] maps ids to
//!   directories inside the store
//! - **Collaborators**: copying goes through a [`mirror::Mirror`] and size
//!   measurement through a [`usage::DiskUsage`]; the `rsync`/`du` variants
//!   start external programs through a [`process::ProcessRunner`], the native
//!   variants work in-process
//! - **Repository**: [`Snap`] implements the store operations with typed
//!   results
//! - **Console**: [`commands::Console`] renders results and errors for the
//!   `snap` binary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapdir::{Snap, SnapConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snap = Snap::new(SnapConfig::new("./my_project"));
//! snap.init()?;
//!
//! let record = snap.save("Initial state")?;
//! println!("Saved snapshot {}", record.id);
//!
//! for record in snap.list()? {
//!     println!("{} {} {}", record.id, record.timestamp_string(), record.message);
//! }
//!
//! snap.restore(record.id)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] with a [`SnapError`]. Errors are either
//! fatal ([`SnapError::is_fatal`]: the store or index cannot be written),
//! caused by an external collaborator ([`SnapError::is_external`]), or user
//! errors such as an unknown snapshot id. [`SnapError::user_message`] gives the
//! text shown by the CLI.
//!
//! ## Module Organization
//!
//! - [`repository`]: [`Snap`] and [`SnapBuilder`]
//! - [`index`]: the snapshot index file
//! - [`snapshots`]: snapshot payload directories
//! - [`mirror`], [`usage`], [`process`]: copy, measurement and process
//!   collaborators
//! - [`commands`], [`cli`]: console rendering and argument parsing
//! - [`types`]: common types and data structures
//! - [`error`]: error types and handling

// Public API modules
pub mod cli;
pub mod commands;
pub mod error;
pub mod index;
pub mod mirror;
pub mod process;
pub mod repository;
pub mod snapshots;
pub mod types;
pub mod usage;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use commands::{CommandStatus, Console};
pub use error::{Result, SnapError};
pub use index::IndexStore;
pub use mirror::{Mirror, NativeMirror, RsyncMirror};
pub use process::{ProcessOutput, ProcessRunner, SystemRunner};
pub use repository::{Snap, SnapBuilder};
pub use types::*;
pub use usage::{DiskUsage, DuUsage, NativeUsage};
