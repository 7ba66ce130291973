//! The log facade: one open segment plus the sealed history.

use std::fs;
use std::mem;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::{IndexPolicy, WalConfig};
use crate::entry::{EntryType, WalEntry};
use crate::segment::{parse_base_offset, Segment};
use crate::types::{EntryIndex, Generation, Result, SedgeError};

/// Counters for one log instance.
#[derive(Clone, Debug, Default)]
pub struct WalStats {
    /// Records appended since open.
    pub entries_appended: u64,
    /// Frame bytes appended since open.
    pub bytes_appended: u64,
    /// Explicit flushes since open.
    pub syncs: u64,
    /// Open segments sealed by the rolling policy since open.
    pub segments_rolled: u64,
}

#[derive(Debug)]
struct WalState {
    /// Mutable segment; always the one with the highest base offset.
    open: Segment,
    /// Immutable segments, ascending by base offset. Never appended to.
    sealed: Vec<Segment>,
    stats: WalStats,
}

/// Segmented append-only log.
///
/// Designed for concurrent callers: every operation takes `&self` and the
/// whole-log state sits behind one reader-writer lock. Appends, rolls,
/// truncation, and flushes hold the lock exclusively; reads of any segment
/// share it. All operations are synchronous and run to completion or error.
#[derive(Debug)]
pub struct Wal {
    config: WalConfig,
    state: RwLock<WalState>,
}

impl Wal {
    /// Opens the log over `config.dir`, creating the directory if missing.
    ///
    /// Every file whose name encodes a base offset is opened as a segment
    /// (rescanning its frames); the one with the highest base offset
    /// becomes the open segment. An empty directory starts with a fresh
    /// segment at base offset 0. Files with other names are skipped.
    pub fn open(config: WalConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.dir)?;

        let mut segments = Vec::new();
        for dir_entry in fs::read_dir(&config.dir)? {
            let dir_entry = dir_entry?;
            let file_name = dir_entry.file_name();
            match file_name.to_str().and_then(parse_base_offset) {
                Some(_) => segments.push(Segment::open_path(&dir_entry.path())?),
                None => {
                    warn!(
                        file = %file_name.to_string_lossy(),
                        "wal.open.skipping_unrecognized_file"
                    );
                }
            }
        }
        segments.sort_by_key(|segment| segment.base_offset());

        let open = match segments.pop() {
            Some(segment) => segment,
            None => Segment::open_at(&config.dir, EntryIndex(0))?,
        };
        debug!(
            dir = %config.dir.display(),
            open_base = %open.base_offset(),
            sealed = segments.len(),
            "wal.open"
        );

        Ok(Self {
            config,
            state: RwLock::new(WalState {
                open,
                sealed: segments,
                stats: WalStats::default(),
            }),
        })
    }

    /// Appends a `Data` record at `last_log_index() + 1` with generation 0.
    pub fn append(&self, payload: &[u8]) -> Result<EntryIndex> {
        self.append_with_generation(payload, Generation(0))
    }

    /// Appends a `Data` record at `last_log_index() + 1`, stamped with the
    /// current wall clock and carrying `generation` opaquely.
    pub fn append_with_generation(
        &self,
        payload: &[u8],
        generation: Generation,
    ) -> Result<EntryIndex> {
        let mut state = self.state.write();
        let index = EntryIndex(last_index_locked(&state).0 + 1);
        let entry = WalEntry::new(index, generation, EntryType::Data, payload.to_vec());
        self.append_locked(&mut state, entry)
    }

    /// Appends a caller-built record carrying an explicit index.
    ///
    /// Under [`IndexPolicy::Permissive`] the index is not validated against
    /// the last written index; gap creation is the caller's responsibility.
    /// Under [`IndexPolicy::Contiguous`] anything other than
    /// `last_log_index() + 1` is rejected.
    pub fn append_entry(&self, entry: WalEntry) -> Result<EntryIndex> {
        let mut state = self.state.write();
        self.append_locked(&mut state, entry)
    }

    fn append_locked(&self, state: &mut WalState, entry: WalEntry) -> Result<EntryIndex> {
        if self.config.index_policy == IndexPolicy::Contiguous {
            let expected = EntryIndex(last_index_locked(state).0 + 1);
            if entry.index != expected {
                return Err(SedgeError::Invalid(
                    "append index is not contiguous with the last log index",
                ));
            }
        }
        self.maybe_roll(state)?;
        let bytes = entry.encoded_len();
        let index = state.open.append(&entry)?;
        state.stats.entries_appended += 1;
        state.stats.bytes_appended += bytes;
        Ok(index)
    }

    /// Seals the open segment and starts a new one once the size threshold
    /// is reached. Rolling never truncates or loses data; it only changes
    /// which file receives subsequent appends.
    fn maybe_roll(&self, state: &mut WalState) -> Result<()> {
        if state.open.size() < self.config.max_segment_bytes {
            return Ok(());
        }
        let Some(last) = state.open.last_index() else {
            return Ok(());
        };
        state.open.flush()?;
        let next = Segment::open_at(&self.config.dir, EntryIndex(last.0 + 1))?;
        let sealed = mem::replace(&mut state.open, next);
        debug!(
            sealed_base = %sealed.base_offset(),
            sealed_bytes = sealed.size(),
            open_base = %state.open.base_offset(),
            "wal.roll"
        );
        state.sealed.push(sealed);
        state.stats.segments_rolled += 1;
        Ok(())
    }

    /// Reads the record at `index` from the open segment.
    ///
    /// Point reads do not search sealed segments: an index that rolled into
    /// the sealed history fails with `MissingIndex` even though its bytes
    /// are on disk. Use [`read_from`](Wal::read_from) for reads across
    /// segments.
    pub fn read_at(&self, index: EntryIndex) -> Result<WalEntry> {
        self.state.read().open.read_at(index)
    }

    /// Every visible record with index `>= start`, ascending.
    ///
    /// Candidate segments are selected by walking the sealed history newest
    /// to oldest, including each segment until one with
    /// `base_offset <= start` has been included, then including the open
    /// segment if its `base_offset <= start`.
    pub fn read_from(&self, start: EntryIndex) -> Result<Vec<WalEntry>> {
        let state = self.state.read();
        read_from_locked(&state, start)
    }

    /// Records visible from the most recent segment boundary forward:
    /// equivalent to `read_from(last_log_index())`.
    ///
    /// This is intentionally not the full history, since sealed history
    /// may be discarded upstream. Callers wanting the log from its very
    /// first index should call `read_from(first_log_index())`.
    pub fn read_all(&self) -> Result<Vec<WalEntry>> {
        let state = self.state.read();
        let last = last_index_locked(&state);
        read_from_locked(&state, last)
    }

    /// Truncates the open segment at `index`: every record with index
    /// `>= index` is removed. Sealed segments are never truncated.
    pub fn truncate(&self, index: EntryIndex) -> Result<()> {
        self.state.write().open.truncate(index)
    }

    /// Highest index recorded in the open segment, or the `EntryIndex(0)`
    /// sentinel when the open segment holds no records.
    ///
    /// After truncating the open segment down to nothing while sealed
    /// segments remain, the sentinel makes the next implicit append restart
    /// at index 1; that is inherent in the open-segment scope of this
    /// accessor.
    pub fn last_log_index(&self) -> EntryIndex {
        last_index_locked(&self.state.read())
    }

    /// The record at [`last_log_index`](Wal::last_log_index).
    pub fn last_log_entry(&self) -> Result<WalEntry> {
        let state = self.state.read();
        state.open.read_at(last_index_locked(&state))
    }

    /// Index of the first record in the lowest-base-offset segment, or
    /// `EntryIndex(0)` when the log is empty.
    pub fn first_log_index(&self) -> EntryIndex {
        let state = self.state.read();
        state
            .sealed
            .first()
            .and_then(Segment::first_index)
            .or_else(|| state.open.first_index())
            .unwrap_or(EntryIndex(0))
    }

    /// True iff a record with `entry.index` has already been written:
    /// `last_log_index() >= entry.index`.
    pub fn entry_exists(&self, entry: &WalEntry) -> bool {
        self.last_log_index() >= entry.index
    }

    /// True iff the open segment holds zero records and there are zero
    /// sealed segments.
    pub fn is_empty(&self) -> bool {
        let state = self.state.read();
        state.open.entry_count() == 0 && state.sealed.is_empty()
    }

    /// Base offsets of the sealed segments, ascending.
    pub fn sealed_base_offsets(&self) -> Vec<EntryIndex> {
        self.state
            .read()
            .sealed
            .iter()
            .map(Segment::base_offset)
            .collect()
    }

    /// Base offset of the open segment.
    pub fn open_segment_base_offset(&self) -> EntryIndex {
        self.state.read().open.base_offset()
    }

    /// Removes the sealed segment with the given base offset from the
    /// collection and deletes its file. Never applies to the open segment;
    /// an unknown base offset is `SegmentNotFound`.
    pub fn remove_and_delete_segment(&self, base_offset: EntryIndex) -> Result<()> {
        let mut state = self.state.write();
        let position = state
            .sealed
            .iter()
            .position(|segment| segment.base_offset() == base_offset)
            .ok_or(SedgeError::SegmentNotFound(base_offset))?;
        let segment = state.sealed.remove(position);
        segment.delete()
    }

    /// Forces the open segment to stable storage.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        state.open.flush()?;
        state.stats.syncs += 1;
        Ok(())
    }

    /// Flushes the open segment, then releases every segment's file handle.
    pub fn close(self) -> Result<()> {
        let state = self.state.into_inner();
        state.open.close()
        // Sealed segment handles are released as `state` drops.
    }

    /// Counters since open.
    pub fn stats(&self) -> WalStats {
        self.state.read().stats.clone()
    }
}

fn last_index_locked(state: &WalState) -> EntryIndex {
    state.open.last_index().unwrap_or(EntryIndex(0))
}

fn read_from_locked(state: &WalState, start: EntryIndex) -> Result<Vec<WalEntry>> {
    let mut candidates = Vec::new();
    for segment in state.sealed.iter().rev() {
        candidates.push(segment);
        if segment.base_offset() <= start {
            break;
        }
    }

    let mut entries = Vec::new();
    for segment in candidates.into_iter().rev() {
        entries.extend(segment.read_from(start)?);
    }
    if state.open.base_offset() <= start {
        entries.extend(state.open.read_from(start)?);
    }
    Ok(entries)
}
