//! Integration tests for snapdir
//!
//! Drives the repository API against real temporary directory trees:
//! save/restore round trips, exclusions, id allocation and failure handling.

use ::snapdir::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;
use walkdir::WalkDir;

/// Test harness owning a working tree and a store inside it
pub struct SnapTestHarness {
    pub work_dir: TempDir,
    pub snap: Snap,
}

/// Shape of a generated project tree
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub max_depth: usize,
    pub dirs_per_level: usize,
    pub files_per_dir: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            dirs_per_level: 2,
            files_per_dir: 3,
        }
    }
}

impl SnapTestHarness {
    /// Harness using the in-process copier
    pub fn new() -> Self {
        Self::with_copier(CopierKind::Native)
    }

    /// Harness using the given copier selection
    pub fn with_copier(copier: CopierKind) -> Self {
        let work_dir = TempDir::new().unwrap();
        let snap = SnapBuilder::new().copier(copier).build(work_dir.path());
        snap.init().unwrap();
        Self { work_dir, snap }
    }

    pub fn root(&self) -> &Path {
        self.work_dir.path()
    }

    /// Write `content` to `rel`, creating parent directories
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Generate a nested tree of small text files
    pub fn generate_project(&self, config: &ProjectConfig, seed: u32) -> anyhow::Result<usize> {
        let mut created = 0;
        for depth in 1..=config.max_depth {
            for dir_idx in 0..config.dirs_per_level {
                let mut path = self.root().to_path_buf();
                for level in 0..depth {
                    path = path.join(format!("dir_{}_{}", level, dir_idx));
                }
                fs::create_dir_all(&path)?;

                for file_idx in 0..config.files_per_dir {
                    let content = format!("seed {} depth {} file {}\n", seed, depth, file_idx);
                    fs::write(path.join(format!("file_{}.txt", file_idx)), content)?;
                    created += 1;
                }
            }
        }
        info!("Generated {} files", created);
        Ok(created)
    }

    /// Every file under the root outside the store, with its content
    pub fn tree_state(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        tree_state(self.root(), &[".snap", ".git"])
    }
}

/// Files under `root` with their content, skipping excluded names
pub fn tree_state(root: &Path, excludes: &[&str]) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut state = BTreeMap::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !excludes.iter().any(|x| e.file_name() == *x));
    for entry in walker {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
            state.insert(rel, fs::read(entry.path()).unwrap());
        }
    }
    state
}

#[test]
fn test_concrete_scenario() {
    let harness = SnapTestHarness::new();
    harness.write("notes.txt", "first version");

    let first = harness.snap.save("first").unwrap();
    assert_eq!(first.id.to_string(), "0001");
    assert_eq!(first.message, "first");

    harness.write("notes.txt", "second version");
    harness.write("src/lib.rs", "pub fn answer() -> u32 { 42 }");
    let second_state = harness.tree_state();
    let second = harness.snap.save("").unwrap();
    assert_eq!(second.id.to_string(), "0002");
    assert_eq!(second.message, "");

    let ids: Vec<String> = harness
        .snap
        .list()
        .unwrap()
        .iter()
        .map(|r| r.id.to_string())
        .collect();
    assert_eq!(ids, vec!["0001", "0002"]);

    harness.snap.delete(first.id).unwrap();
    let records = harness.snap.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, second.id);

    harness.write("notes.txt", "third version");
    harness.write("scratch.tmp", "junk");
    fs::remove_dir_all(harness.root().join("src")).unwrap();

    harness.snap.restore(second.id).unwrap();
    assert_eq!(harness.tree_state(), second_state);
}

#[test]
fn test_restore_round_trip_nested_tree() {
    let harness = SnapTestHarness::new();
    let config = ProjectConfig::default();
    harness.generate_project(&config, 1).unwrap();
    let original = harness.tree_state();
    let record = harness.snap.save("generated").unwrap();

    // Rewrite, delete and add across the tree
    harness.generate_project(&config, 2).unwrap();
    fs::remove_dir_all(harness.root().join("dir_0_0")).unwrap();
    harness.write("new_dir/deep/new.txt", "added later");
    fs::create_dir_all(harness.root().join("empty_later")).unwrap();
    assert_ne!(harness.tree_state(), original);

    harness.snap.restore(record.id).unwrap();
    assert_eq!(harness.tree_state(), original);
    assert!(!harness.root().join("new_dir").exists());
    assert!(!harness.root().join("empty_later").exists());
}

#[test]
fn test_store_and_git_are_excluded() {
    let harness = SnapTestHarness::new();
    harness.write(".git/HEAD", "ref: refs/heads/main");
    harness.write("README.md", "# project");

    let record = harness.snap.save("with vcs").unwrap();
    let snapshot_dir = harness.snap.snapshots().path_for(record.id);
    assert!(snapshot_dir.join("README.md").is_file());
    assert!(!snapshot_dir.join(".git").exists());
    assert!(!snapshot_dir.join(".snap").exists());

    // Restoring leaves the repository metadata alone
    harness.write(".git/HEAD", "ref: refs/heads/feature");
    harness.snap.restore(record.id).unwrap();
    assert_eq!(
        fs::read_to_string(harness.root().join(".git/HEAD")).unwrap(),
        "ref: refs/heads/feature"
    );
    assert!(harness.snap.index().exists());
}

#[test]
fn test_ids_are_never_reused() {
    let harness = SnapTestHarness::new();
    let a = harness.snap.save("a").unwrap();
    let b = harness.snap.save("b").unwrap();

    harness.snap.delete(b.id).unwrap();
    let c = harness.snap.save("c").unwrap();
    assert_eq!(c.id.get(), 3);

    harness.snap.delete(a.id).unwrap();
    harness.snap.delete(c.id).unwrap();
    assert!(harness.snap.list().unwrap().is_empty());
    assert_eq!(harness.snap.save("d").unwrap().id.get(), 4);
}

#[test]
fn test_external_store_path() {
    let work_dir = TempDir::new().unwrap();
    let store_parent = TempDir::new().unwrap();
    let store = store_parent.path().join("snapshots");

    let snap = SnapBuilder::new()
        .store_path(&store)
        .copier(CopierKind::Native)
        .build(work_dir.path());
    snap.init().unwrap();
    fs::write(work_dir.path().join("a.txt"), "A").unwrap();

    let record = snap.save("outside").unwrap();
    assert!(store.join("0001/a.txt").is_file());
    assert!(store.join("index.txt").is_file());
    assert!(!work_dir.path().join(".snap").exists());

    fs::write(work_dir.path().join("a.txt"), "changed").unwrap();
    snap.restore(record.id).unwrap();
    assert_eq!(fs::read_to_string(work_dir.path().join("a.txt")).unwrap(), "A");
}

#[test]
fn test_custom_excludes() {
    let work_dir = TempDir::new().unwrap();
    let snap = SnapBuilder::new()
        .excludes(vec!["target".to_string(), "node_modules".to_string()])
        .copier(CopierKind::Native)
        .build(work_dir.path());
    snap.init().unwrap();

    fs::create_dir_all(work_dir.path().join("target/debug")).unwrap();
    fs::write(work_dir.path().join("target/debug/app"), "binary").unwrap();
    fs::create_dir_all(work_dir.path().join("web/node_modules/pkg")).unwrap();
    fs::write(work_dir.path().join("web/node_modules/pkg/index.js"), "js").unwrap();
    fs::write(work_dir.path().join("web/app.js"), "app").unwrap();

    let record = snap.save("build outputs skipped").unwrap();
    let dir = snap.snapshots().path_for(record.id);
    assert!(dir.join("web/app.js").is_file());
    assert!(!dir.join("target").exists());
    assert!(!dir.join("web/node_modules").exists());
}

#[test]
fn test_messages_survive_index_round_trip() {
    let harness = SnapTestHarness::new();
    let messages = [
        "plain",
        "pipes | inside | message",
        "multi\nline\r\nmessage",
        "back\\slash \\| and \\n literally",
        "  padded  ",
        "ünïcödé 🚀",
    ];
    for message in &messages {
        harness.snap.save(message).unwrap();
    }

    let listed: Vec<String> = harness
        .snap
        .list()
        .unwrap()
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(listed, messages);

    let index = fs::read_to_string(harness.snap.index().path()).unwrap();
    assert_eq!(index.lines().count(), messages.len());
}

#[test]
fn test_failed_save_can_be_retried() {
    struct FlakyMirror {
        failures_left: std::sync::Mutex<u32>,
    }

    impl Mirror for FlakyMirror {
        fn name(&self) -> &str {
            "flaky"
        }

        fn mirror(&self, source: &Path, destination: &Path, excludes: &[String]) -> Result<()> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                fs::create_dir_all(destination)?;
                fs::write(destination.join("partial"), "half written")?;
                return Err(SnapError::tool_failed("flaky", "interrupted"));
            }
            NativeMirror.mirror(source, destination, excludes)
        }
    }

    let work_dir = TempDir::new().unwrap();
    fs::write(work_dir.path().join("a.txt"), "A").unwrap();
    let snap = SnapBuilder::new()
        .mirror(Box::new(FlakyMirror {
            failures_left: std::sync::Mutex::new(1),
        }))
        .disk_usage(Box::new(NativeUsage))
        .build(work_dir.path());
    snap.init().unwrap();

    assert!(snap.save("first try").unwrap_err().is_external());
    assert!(snap.list().unwrap().is_empty());

    // The retry reuses the id and mirrors over the partial directory
    let record = snap.save("second try").unwrap();
    assert_eq!(record.id, SnapshotId::FIRST);
    let dir = snap.snapshots().path_for(record.id);
    assert!(dir.join("a.txt").is_file());
    assert!(!dir.join("partial").exists());
}

#[test]
fn test_rsync_copier_when_installed() {
    if !process::probe(&SystemRunner, RsyncMirror::PROGRAM) {
        eprintln!("rsync not installed, skipping");
        return;
    }

    let harness = SnapTestHarness::with_copier(CopierKind::Rsync);
    assert_eq!(harness.snap.snapshots().mirror_name(), "rsync");
    harness.write("a.txt", "A");
    harness.write(".git/HEAD", "ref");
    let original = harness.tree_state();
    let record = harness.snap.save("via rsync").unwrap();
    assert!(!harness.snap.snapshots().path_for(record.id).join(".snap").exists());

    harness.write("a.txt", "B");
    harness.write("extra.txt", "extra");
    harness.snap.restore(record.id).unwrap();
    assert_eq!(harness.tree_state(), original);

    let status = harness.snap.status().unwrap();
    assert_eq!(status.snapshot_count, 1);
    assert!(status.total_size.is_some());
}

#[test]
fn test_delete_keeps_unparsable_index_lines() {
    let harness = SnapTestHarness::new();
    harness.snap.save("one").unwrap();
    let index_path = harness.snap.index().path().to_path_buf();
    let mut content = fs::read_to_string(&index_path).unwrap();
    content.push_str("garbage line without fields\n");
    fs::write(&index_path, content).unwrap();
    harness.snap.save("two").unwrap();

    assert_eq!(harness.snap.list().unwrap().len(), 2);
    harness.snap.delete(SnapshotId::FIRST).unwrap();

    let content = fs::read_to_string(&index_path).unwrap();
    assert!(content.contains("garbage line without fields"));
    assert!(!content.starts_with("0001"));
    assert_eq!(harness.snap.status().unwrap().snapshot_count, 1);
}
