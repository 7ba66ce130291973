//! One on-disk segment file and its in-memory offset index.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::entry::WalEntry;
use crate::io::{FileIo, StdFileIo};
use crate::reader::FrameReader;
use crate::types::{EntryIndex, Result, SedgeError};

const SEGMENT_FILE_PREFIX: &str = "wal_";
const SEGMENT_FILE_SUFFIX: &str = ".log";

/// File name for the segment starting at `base_offset`.
///
/// The numeric part is the authoritative base offset for the file and
/// round-trips losslessly through [`parse_base_offset`].
pub fn segment_file_name(base_offset: EntryIndex) -> String {
    format!("{SEGMENT_FILE_PREFIX}{base_offset}{SEGMENT_FILE_SUFFIX}")
}

/// Base offset encoded in a segment file name, if the name is one.
pub fn parse_base_offset(file_name: &str) -> Option<EntryIndex> {
    let digits = file_name
        .strip_prefix(SEGMENT_FILE_PREFIX)?
        .strip_suffix(SEGMENT_FILE_SUFFIX)?;
    digits.parse::<u64>().ok().map(EntryIndex)
}

/// One segment: a contiguous index range `[base_offset, ..)` stored in a
/// single file, plus the map from index to frame start offset.
///
/// The offset map is never persisted. It is rebuilt from the raw bytes on
/// every open by decoding frames from byte 0 to end-of-file; a torn final
/// write (fewer bytes than the frame declares) is physically truncated away
/// during that scan, which is the crash-recovery contract.
#[derive(Debug)]
pub struct Segment {
    base_offset: EntryIndex,
    path: PathBuf,
    io: StdFileIo,
    len: u64,
    index: BTreeMap<EntryIndex, u64>,
}

impl Segment {
    /// Creates or opens the segment named for `base_offset` inside `dir`.
    pub fn open_at(dir: &Path, base_offset: EntryIndex) -> Result<Self> {
        Self::open(dir.join(segment_file_name(base_offset)), base_offset)
    }

    /// Opens an existing segment file; the base offset is parsed from the
    /// file name.
    pub fn open_path(path: &Path) -> Result<Self> {
        let base_offset = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_base_offset)
            .ok_or(SedgeError::Invalid(
                "file name does not encode a segment base offset",
            ))?;
        Self::open(path.to_path_buf(), base_offset)
    }

    fn open(path: PathBuf, base_offset: EntryIndex) -> Result<Self> {
        let io = StdFileIo::open(&path)?;
        let (index, len) = build_index(&io, &path)?;
        debug!(
            path = %path.display(),
            base_offset = %base_offset,
            entries = index.len(),
            bytes = len,
            "wal.segment.open"
        );
        Ok(Self {
            base_offset,
            path,
            io,
            len,
            index,
        })
    }

    /// Lowest index this segment is permitted to contain.
    pub fn base_offset(&self) -> EntryIndex {
        self.base_offset
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file size in bytes.
    pub fn size(&self) -> u64 {
        self.len
    }

    /// Number of records currently indexed.
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    /// Lowest indexed record, if any.
    pub fn first_index(&self) -> Option<EntryIndex> {
        self.index.keys().next().copied()
    }

    /// Highest indexed record, if any.
    pub fn last_index(&self) -> Option<EntryIndex> {
        self.index.keys().next_back().copied()
    }

    /// Timestamp of the first record, if any.
    pub fn first_timestamp_ms(&self) -> Result<Option<u64>> {
        match self.first_index() {
            Some(index) => Ok(Some(self.read_at(index)?.timestamp_ms)),
            None => Ok(None),
        }
    }

    /// Timestamp of the last record, if any.
    pub fn last_timestamp_ms(&self) -> Result<Option<u64>> {
        match self.last_index() {
            Some(index) => Ok(Some(self.read_at(index)?.timestamp_ms)),
            None => Ok(None),
        }
    }

    /// Appends the record's frame at end-of-file and records its offset.
    ///
    /// Does not flush; durability is the caller's call via [`flush`].
    ///
    /// [`flush`]: Segment::flush
    pub fn append(&mut self, entry: &WalEntry) -> Result<EntryIndex> {
        let offset = self.len;
        let frame = entry.encode();
        self.io.write_at(offset, &frame)?;
        self.len += frame.len() as u64;
        self.index.insert(entry.index, offset);
        Ok(entry.index)
    }

    /// Reads the record at `index`; `MissingIndex` if it is not indexed.
    pub fn read_at(&self, index: EntryIndex) -> Result<WalEntry> {
        let offset = *self
            .index
            .get(&index)
            .ok_or(SedgeError::MissingIndex(index))?;
        FrameReader::new(&self.io).read_frame(offset)
    }

    /// Every record with index `>= start`, in ascending index order.
    pub fn read_from(&self, start: EntryIndex) -> Result<Vec<WalEntry>> {
        let reader = FrameReader::new(&self.io);
        let mut entries = Vec::new();
        for (_, &offset) in self.index.range(start..) {
            entries.push(reader.read_frame(offset)?);
        }
        Ok(entries)
    }

    /// Every record in the segment, in ascending index order.
    pub fn read_all(&self) -> Result<Vec<WalEntry>> {
        match self.first_index() {
            Some(first) => self.read_from(first),
            None => Ok(Vec::new()),
        }
    }

    /// Physically truncates the file at the frame start of `index` and
    /// drops every index entry `>= index` from the map.
    pub fn truncate(&mut self, index: EntryIndex) -> Result<()> {
        let offset = *self
            .index
            .get(&index)
            .ok_or(SedgeError::MissingIndex(index))?;
        self.io.truncate(offset)?;
        self.index.split_off(&index);
        self.len = offset;
        Ok(())
    }

    /// Forces the file's bytes to stable storage.
    pub fn flush(&self) -> Result<()> {
        self.io.sync_all()
    }

    /// Flushes, then releases the file handle.
    pub fn close(self) -> Result<()> {
        self.flush()
    }

    /// Releases the file handle, removes the file, and discards the index.
    pub fn delete(self) -> Result<()> {
        let Segment { path, io, .. } = self;
        debug!(path = %path.display(), "wal.segment.delete");
        drop(io);
        fs::remove_file(&path)?;
        Ok(())
    }
}

/// Sequentially decodes frames from byte 0, recording each frame's start
/// offset. A trailing partial frame truncates the file at the last good
/// frame and ends the scan; any other decode failure is surfaced.
fn build_index(io: &StdFileIo, path: &Path) -> Result<(BTreeMap<EntryIndex, u64>, u64)> {
    let mut index = BTreeMap::new();
    let mut offset = 0u64;
    let len = io.len()?;
    let reader = FrameReader::new(io);
    while offset < len {
        match reader.read_frame(offset) {
            Ok(entry) => {
                index.insert(entry.index, offset);
                offset += entry.encoded_len();
            }
            Err(SedgeError::CorruptFrame(reason)) => {
                warn!(
                    path = %path.display(),
                    offset,
                    reason,
                    "wal.segment.torn_tail_truncated"
                );
                io.truncate(offset)?;
                break;
            }
            Err(err) => return Err(err),
        }
    }
    Ok((index, offset))
}
