use sedge::{
    EntryIndex, EntryType, Generation, IndexPolicy, Result, SedgeError, Wal, WalConfig, WalEntry,
};
use tempfile::tempdir;

#[test]
fn append_read_truncate_lifecycle() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let wal = Wal::open(WalConfig::new(dir.path()))?;

    assert!(wal.is_empty());
    assert_eq!(wal.last_log_index(), EntryIndex(0));

    assert_eq!(wal.append(b"a")?, EntryIndex(1));
    assert_eq!(wal.append(b"b")?, EntryIndex(2));
    assert_eq!(wal.append(b"c")?, EntryIndex(3));
    assert!(!wal.is_empty());

    let tail = wal.read_from(EntryIndex(2))?;
    let payloads: Vec<&[u8]> = tail.iter().map(|e| e.payload.as_slice()).collect();
    assert_eq!(payloads, vec![b"b".as_slice(), b"c".as_slice()]);

    assert_eq!(wal.read_at(EntryIndex(1))?.payload, b"a");

    wal.truncate(EntryIndex(2))?;
    assert_eq!(wal.last_log_index(), EntryIndex(1));
    assert!(matches!(
        wal.read_at(EntryIndex(2)),
        Err(SedgeError::MissingIndex(EntryIndex(2)))
    ));
    Ok(())
}

#[test]
fn implicit_appends_are_data_entries_with_generation() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let wal = Wal::open(WalConfig::new(dir.path()))?;

    wal.append(b"plain")?;
    wal.append_with_generation(b"term7", Generation(7))?;

    let first = wal.read_at(EntryIndex(1))?;
    assert_eq!(first.entry_type, EntryType::Data);
    assert_eq!(first.generation, Generation(0));
    assert!(first.timestamp_ms > 0);

    let second = wal.read_at(EntryIndex(2))?;
    assert_eq!(second.generation, Generation(7));
    Ok(())
}

#[test]
fn first_and_last_index_accessors() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let wal = Wal::open(WalConfig::new(dir.path()))?;
    assert_eq!(wal.first_log_index(), EntryIndex(0));

    wal.append(b"x")?;
    wal.append(b"y")?;
    assert_eq!(wal.first_log_index(), EntryIndex(1));
    assert_eq!(wal.last_log_index(), EntryIndex(2));
    assert_eq!(wal.last_log_entry()?.payload, b"y");
    Ok(())
}

#[test]
fn entry_exists_compares_against_last_index() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let wal = Wal::open(WalConfig::new(dir.path()))?;
    wal.append(b"one")?;
    wal.append(b"two")?;

    let written = WalEntry::new(EntryIndex(2), Generation(0), EntryType::Data, Vec::new());
    let unwritten = WalEntry::new(EntryIndex(9), Generation(0), EntryType::Data, Vec::new());
    assert!(wal.entry_exists(&written));
    assert!(!wal.entry_exists(&unwritten));
    Ok(())
}

#[test]
fn permissive_policy_accepts_gapped_explicit_index() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let wal = Wal::open(WalConfig::new(dir.path()))?;
    wal.append(b"one")?;

    let gapped = WalEntry::new(EntryIndex(5), Generation(1), EntryType::Data, b"five".to_vec());
    assert_eq!(wal.append_entry(gapped)?, EntryIndex(5));
    assert_eq!(wal.last_log_index(), EntryIndex(5));
    // The next implicit append continues from the gapped index.
    assert_eq!(wal.append(b"six")?, EntryIndex(6));
    Ok(())
}

#[test]
fn contiguous_policy_rejects_gapped_explicit_index() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let config = WalConfig::new(dir.path()).with_index_policy(IndexPolicy::Contiguous);
    let wal = Wal::open(config)?;
    wal.append(b"one")?;

    let gapped = WalEntry::new(EntryIndex(5), Generation(0), EntryType::Data, Vec::new());
    assert!(matches!(
        wal.append_entry(gapped),
        Err(SedgeError::Invalid(_))
    ));

    let next = WalEntry::new(EntryIndex(2), Generation(0), EntryType::Data, Vec::new());
    assert_eq!(wal.append_entry(next)?, EntryIndex(2));
    Ok(())
}

#[test]
fn read_all_reads_from_the_last_index_forward() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let wal = Wal::open(WalConfig::new(dir.path()))?;
    assert!(wal.read_all()?.is_empty());

    wal.append(b"a")?;
    wal.append(b"b")?;
    let visible = wal.read_all()?;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].payload, b"b");

    // The full history is read_from(first_log_index()).
    let full = wal.read_from(wal.first_log_index())?;
    assert_eq!(full.len(), 2);
    Ok(())
}

#[test]
fn close_flushes_and_releases() -> Result<()> {
    let dir = tempdir().expect("tmpdir");
    let wal = Wal::open(WalConfig::new(dir.path()))?;
    wal.append(b"durable")?;
    wal.close()?;

    let reopened = Wal::open(WalConfig::new(dir.path()))?;
    assert_eq!(reopened.last_log_index(), EntryIndex(1));
    Ok(())
}
