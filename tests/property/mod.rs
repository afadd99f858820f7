//! Property-based testing for snapdir
//!
//! Uses proptest to check id allocation and index encoding across randomly
//! generated operation sequences and messages.

use ::snapdir::index::{decode_record, encode_record};
use ::snapdir::*;
use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

/// One step against a store
#[derive(Debug, Clone)]
pub enum StoreOperation {
    Save { message: String },
    /// Delete the n-th live snapshot (modulo the live count)
    Delete { pick: usize },
}

fn message_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,40}",
        "[a-z|\\\\ ]{0,20}",
        any::<String>(),
        Just(String::new()),
    ]
}

fn operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        3 => message_strategy().prop_map(|message| StoreOperation::Save { message }),
        1 => any::<usize>().prop_map(|pick| StoreOperation::Delete { pick }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_record_line_round_trip(id in 1u32..100_000, message in any::<String>(), secs in 0u32..86_400) {
        let timestamp = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60)
            .unwrap();
        let record = SnapshotRecord::new(SnapshotId::new(id).unwrap(), timestamp, message);

        let line = encode_record(&record);
        prop_assert!(!line.contains('\n'));
        prop_assert!(line.split('|').count() >= 3);
        prop_assert_eq!(decode_record(&line).unwrap(), record);
    }

    #[test]
    fn prop_snapshot_id_text(value in 1u32..1_000_000) {
        let id = SnapshotId::new(value).unwrap();
        let text = id.to_string();
        prop_assert!(text.len() >= 4);
        prop_assert_eq!(text.parse::<SnapshotId>().unwrap(), id);
        prop_assert_eq!(value.to_string().parse::<SnapshotId>().unwrap(), id);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_ids_strictly_increase(ops in prop::collection::vec(operation_strategy(), 1..20)) {
        let work_dir = TempDir::new().unwrap();
        fs::write(work_dir.path().join("file.txt"), "content").unwrap();
        let snap = SnapBuilder::new()
            .copier(CopierKind::Native)
            .build(work_dir.path());
        snap.init().unwrap();

        let mut live: BTreeSet<SnapshotId> = BTreeSet::new();
        let mut saves = 0u32;
        let mut last: Option<SnapshotId> = None;

        for op in &ops {
            match op {
                StoreOperation::Save { message } => {
                    let record = snap.save(message).unwrap();
                    saves += 1;
                    // Nth successful save gets id N
                    prop_assert_eq!(record.id.get(), saves);
                    if let Some(prev) = last {
                        prop_assert!(record.id > prev);
                    }
                    prop_assert_eq!(&record.message, message);
                    last = Some(record.id);
                    live.insert(record.id);
                }
                StoreOperation::Delete { pick } => {
                    if live.is_empty() {
                        continue;
                    }
                    let id = *live.iter().nth(pick % live.len()).unwrap();
                    snap.delete(id).unwrap();
                    live.remove(&id);
                }
            }

            // Index and directories never diverge
            let listed: Vec<SnapshotId> = snap.list().unwrap().iter().map(|r| r.id).collect();
            let expected: Vec<SnapshotId> = live.iter().copied().collect();
            prop_assert_eq!(&listed, &expected);
            for id in &listed {
                prop_assert!(snap.snapshots().exists(*id));
            }
        }
    }
}
