//! Core identifier types and the crate-wide error taxonomy.

use std::fmt;

/// Position of one record in the log. Strictly increasing within a log
/// instance; `EntryIndex(0)` is the sentinel for "no records yet".
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EntryIndex(pub u64);

/// Caller-assigned epoch/term number. Carried opaquely with every record;
/// never interpreted by this crate.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Generation(pub u64);

impl fmt::Display for EntryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntryIndex {
    fn from(value: u64) -> Self {
        EntryIndex(value)
    }
}

impl From<EntryIndex> for u64 {
    fn from(value: EntryIndex) -> Self {
        value.0
    }
}

impl From<u64> for Generation {
    fn from(value: u64) -> Self {
        Generation(value)
    }
}

impl From<Generation> for u64 {
    fn from(value: Generation) -> Self {
        value.0
    }
}

/// Errors surfaced by the log.
///
/// Only `Io` and `CorruptFrame` are expected in normal degraded operation;
/// the remaining variants indicate caller misuse or bad configuration.
#[derive(thiserror::Error, Debug)]
pub enum SedgeError {
    /// Underlying storage failure. Fatal to the operation; never retried
    /// here. Retry/backoff policy belongs to a higher layer.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// A decoded frame size points past end-of-file, or the frame is too
    /// small to hold its own fixed header.
    #[error("corrupt frame: {0}")]
    CorruptFrame(&'static str),
    /// A type tag outside the closed set was read from disk.
    #[error("unknown entry type tag {0}")]
    UnknownEntryType(u32),
    /// The requested index is not present in the segment's offset map.
    #[error("index {0} not present in segment")]
    MissingIndex(EntryIndex),
    /// Removal was requested for a sealed segment that is not held.
    #[error("no sealed segment with base offset {0}")]
    SegmentNotFound(EntryIndex),
    /// Rejected configuration at log construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Caller misuse, e.g. a non-contiguous explicit index under
    /// [`IndexPolicy::Contiguous`](crate::config::IndexPolicy).
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SedgeError>;
