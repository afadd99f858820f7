//! Main test module for snapdir
//!
//! This module includes all test suites:
//! - Integration tests for save/restore scenarios
//! - Property-based tests for invariants
//! - Edge cases around unusual trees and store contents

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use super::integration::SnapTestHarness;
    use ::snapdir::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_directory() {
        let harness = SnapTestHarness::new();

        // Snapshot of an empty tree
        let record = harness.snap.save("Empty").unwrap();
        assert!(harness.snap.snapshots().exists(record.id));

        // Restore should remove files added afterwards
        harness.write("file.txt", "content");
        harness.snap.restore(record.id).unwrap();
        assert!(!harness.root().join("file.txt").exists());
        assert!(harness.snap.store_path().is_dir());
    }

    #[test]
    fn test_special_filenames() {
        let harness = SnapTestHarness::new();
        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file|with|pipes.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
            "file[with]brackets.txt",
        ];

        let mut created = Vec::new();
        for name in &special_names {
            if fs::write(harness.root().join(name), format!("Content of {}", name)).is_ok() {
                created.push(*name);
            }
        }

        let record = harness.snap.save("Special names").unwrap();
        for name in &created {
            fs::remove_file(harness.root().join(name)).unwrap();
        }
        harness.snap.restore(record.id).unwrap();

        for name in &created {
            let content = fs::read_to_string(harness.root().join(name)).unwrap();
            assert_eq!(content, format!("Content of {}", name));
        }
    }

    #[test]
    fn test_unicode_filenames() {
        let harness = SnapTestHarness::new();
        let unicode_names = vec!["файл.txt", "文件.txt", "ファイル.txt", "🚀🌟💾.txt"];

        let mut created = Vec::new();
        for name in &unicode_names {
            if fs::write(harness.root().join(name), format!("Unicode content: {}", name)).is_ok() {
                created.push(*name);
            }
        }
        if created.is_empty() {
            return;
        }

        let record = harness.snap.save("Unicode names").unwrap();
        for name in &created {
            fs::remove_file(harness.root().join(name)).unwrap();
        }
        harness.snap.restore(record.id).unwrap();

        for name in &created {
            let content = fs::read_to_string(harness.root().join(name)).unwrap();
            assert_eq!(content, format!("Unicode content: {}", name));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_preservation() {
        use std::os::unix::fs::PermissionsExt;

        let harness = SnapTestHarness::new();
        let files = vec![
            ("readable.txt", 0o644),
            ("executable.sh", 0o755),
            ("useronly.txt", 0o600),
        ];
        for (name, mode) in &files {
            let path = harness.root().join(name);
            fs::write(&path, format!("Content of {}", name)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(*mode)).unwrap();
        }

        let record = harness.snap.save("Permissions").unwrap();
        for (name, _) in &files {
            let path = harness.root().join(name);
            fs::set_permissions(&path, fs::Permissions::from_mode(0o666)).unwrap();
        }
        harness.snap.restore(record.id).unwrap();

        for (name, expected_mode) in &files {
            let metadata = fs::metadata(harness.root().join(name)).unwrap();
            let actual_mode = metadata.permissions().mode() & 0o777;
            assert_eq!(
                actual_mode, *expected_mode,
                "Permission mismatch for {}: expected {:o}, got {:o}",
                name, expected_mode, actual_mode
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_restored_as_links() {
        let harness = SnapTestHarness::new();
        harness.write("target.txt", "Target content");
        std::os::unix::fs::symlink("target.txt", harness.root().join("link.txt")).unwrap();

        let record = harness.snap.save("With symlink").unwrap();
        fs::remove_file(harness.root().join("link.txt")).unwrap();
        fs::remove_file(harness.root().join("target.txt")).unwrap();
        harness.snap.restore(record.id).unwrap();

        let link = harness.root().join("link.txt");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link).unwrap(), "Target content");
    }

    #[test]
    fn test_file_replaced_by_directory() {
        let harness = SnapTestHarness::new();
        harness.write("thing", "a file");
        let record = harness.snap.save("file").unwrap();

        fs::remove_file(harness.root().join("thing")).unwrap();
        harness.write("thing/inner.txt", "now a directory");
        harness.snap.restore(record.id).unwrap();

        assert_eq!(fs::read_to_string(harness.root().join("thing")).unwrap(), "a file");
    }

    #[test]
    fn test_index_removed_by_hand() {
        let harness = SnapTestHarness::new();
        harness.snap.save("one").unwrap();
        fs::remove_file(harness.snap.index().path()).unwrap();

        assert!(harness.snap.list().unwrap().is_empty());
        assert_eq!(harness.snap.status().unwrap().snapshot_count, 0);
        // The high-water mark still prevents reuse of 0001
        assert_eq!(harness.snap.save("two").unwrap().id.get(), 2);
        assert!(harness.snap.index().exists());
    }

    #[test]
    fn test_directory_without_record_can_be_deleted() {
        let harness = SnapTestHarness::new();
        fs::create_dir_all(harness.snap.store_path().join("0007")).unwrap();

        let id = harness.snap.resolve("7").unwrap();
        harness.snap.delete(id).unwrap();
        assert!(!harness.snap.store_path().join("0007").exists());
    }

    #[test]
    fn test_uninitialized_store_is_untouched() {
        let work_dir = TempDir::new().unwrap();
        let snap = SnapBuilder::new()
            .copier(CopierKind::Native)
            .build(work_dir.path());

        assert!(matches!(snap.save("x"), Err(SnapError::NotInitialized(_))));
        assert!(matches!(snap.resolve("1"), Err(SnapError::NotInitialized(_))));
        assert!(snap.list().unwrap().is_empty());
        assert_eq!(fs::read_dir(work_dir.path()).unwrap().count(), 0);
    }
}
