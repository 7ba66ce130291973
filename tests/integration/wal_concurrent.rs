use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use sedge::{EntryIndex, Result, Wal, WalConfig};
use tempfile::tempdir;

const WRITERS: usize = 4;
const APPENDS_PER_WRITER: usize = 50;

#[test]
fn threaded_appends_yield_unique_gapless_indices() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let config = WalConfig::new(dir.path()).with_max_segment_bytes(512);
    let wal = Arc::new(Wal::open(config)?);

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let wal = Arc::clone(&wal);
        handles.push(thread::spawn(move || {
            let mut indices = Vec::with_capacity(APPENDS_PER_WRITER);
            for i in 0..APPENDS_PER_WRITER {
                let payload = format!("w{writer}-{i}");
                indices.push(wal.append(payload.as_bytes()).expect("append").0);
            }
            indices
        }));
    }

    let mut all = BTreeSet::new();
    for handle in handles {
        for index in handle.join().expect("writer thread") {
            assert!(all.insert(index), "duplicate index {index}");
        }
    }

    let total = (WRITERS * APPENDS_PER_WRITER) as u64;
    assert_eq!(all.len() as u64, total);
    assert_eq!(all.first().copied(), Some(1));
    assert_eq!(all.last().copied(), Some(total));
    assert_eq!(wal.last_log_index(), EntryIndex(total));
    Ok(())
}

#[test]
fn readers_run_alongside_writers() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let config = WalConfig::new(dir.path()).with_max_segment_bytes(512);
    let wal = Arc::new(Wal::open(config)?);
    wal.append(b"seed")?;

    let writer = {
        let wal = Arc::clone(&wal);
        thread::spawn(move || {
            for i in 0..200usize {
                wal.append(format!("payload-{i}").as_bytes()).expect("append");
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let wal = Arc::clone(&wal);
            thread::spawn(move || {
                for _ in 0..100 {
                    let last = wal.last_log_index();
                    assert!(last >= EntryIndex(1));
                    // Every index the facade reports must stay readable
                    // through the multi-segment path.
                    let entries = wal.read_from(last).expect("read_from");
                    assert!(entries.iter().all(|e| e.index >= last));
                }
            })
        })
        .collect();

    writer.join().expect("writer thread");
    for reader in readers {
        reader.join().expect("reader thread");
    }
    assert_eq!(wal.last_log_index(), EntryIndex(201));
    Ok(())
}
