//! Record values and their on-disk frame layout.
//!
//! One record is persisted as a length-prefixed frame, all integers
//! big-endian, fields in this exact order:
//!
//! ```text
//! [u32 frame_size] [u32 entry_type] [u64 generation] [u64 index] [u64 timestamp_ms] [payload]
//! ```
//!
//! `frame_size` counts everything after the leading size field itself, so a
//! record occupies `4 + frame_size` bytes on disk. This layout is the
//! contract between writer and reader; changing it breaks recovery of
//! existing logs.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{EntryIndex, Generation, Result, SedgeError};

/// Bytes of the leading `frame_size` field.
pub const FRAME_PREFIX_LEN: usize = 4;
/// Bytes of the fixed header after the size prefix: type tag, generation,
/// index, timestamp.
pub const FRAME_HEADER_LEN: usize = 4 + 8 + 8 + 8;

/// Semantic kind of a record. Closed set; unknown tags on disk are an
/// explicit error, never defaulted.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EntryType {
    /// Caller payload.
    Data = 0,
    /// Log-internal metadata.
    Metadata = 1,
    /// Checksum record.
    Crc = 2,
}

impl EntryType {
    /// Stable on-disk tag.
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for EntryType {
    type Error = SedgeError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(EntryType::Data),
            1 => Ok(EntryType::Metadata),
            2 => Ok(EntryType::Crc),
            other => Err(SedgeError::UnknownEntryType(other)),
        }
    }
}

/// One framed record: immutable once constructed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WalEntry {
    /// Position in the log.
    pub index: EntryIndex,
    /// Caller-assigned epoch/term, carried opaquely.
    pub generation: Generation,
    /// Unix milliseconds, stamped at construction time.
    pub timestamp_ms: u64,
    /// Semantic kind.
    pub entry_type: EntryType,
    /// Raw payload bytes; length is not bounded by this layer.
    pub payload: Vec<u8>,
}

impl WalEntry {
    /// New record stamped with the current wall clock.
    pub fn new(
        index: EntryIndex,
        generation: Generation,
        entry_type: EntryType,
        payload: Vec<u8>,
    ) -> Self {
        Self::from_parts(index, generation, unix_millis(), entry_type, payload)
    }

    /// Record with every field supplied, including the timestamp. Used when
    /// decoding frames so the stored timestamp is preserved.
    pub fn from_parts(
        index: EntryIndex,
        generation: Generation,
        timestamp_ms: u64,
        entry_type: EntryType,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            index,
            generation,
            timestamp_ms,
            entry_type,
            payload,
        }
    }

    /// Value of the frame's leading size field: fixed header plus payload.
    pub fn frame_size(&self) -> u32 {
        (FRAME_HEADER_LEN + self.payload.len()) as u32
    }

    /// Total bytes this record occupies on disk, size prefix included.
    pub fn encoded_len(&self) -> u64 {
        (FRAME_PREFIX_LEN + FRAME_HEADER_LEN + self.payload.len()) as u64
    }

    /// Serializes the record into its frame.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len() as usize);
        buf.extend_from_slice(&self.frame_size().to_be_bytes());
        buf.extend_from_slice(&self.entry_type.as_u32().to_be_bytes());
        buf.extend_from_slice(&self.generation.0.to_be_bytes());
        buf.extend_from_slice(&self.index.0.to_be_bytes());
        buf.extend_from_slice(&self.timestamp_ms.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
