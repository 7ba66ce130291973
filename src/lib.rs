//! Segmented append-only write-ahead log.
//!
//! A durable, ordered sequence of binary records addressed by a strictly
//! increasing index, split across rotating segment files. Exactly one
//! segment is open for appends at a time; sealed segments are immutable.
//! Each segment rebuilds its index-to-offset map by rescanning its raw
//! bytes on open, truncating a torn final write, which is the whole of the
//! crash-recovery story.
//!
//! ```no_run
//! use sedge::{Wal, WalConfig};
//!
//! # fn main() -> sedge::Result<()> {
//! let wal = Wal::open(WalConfig::new("/var/lib/myapp/wal"))?;
//! let index = wal.append(b"hello")?;
//! let entry = wal.read_at(index)?;
//! assert_eq!(entry.payload, b"hello");
//! wal.flush()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod entry;
pub mod io;
pub mod logging;
pub mod reader;
pub mod segment;
pub mod types;
pub mod wal;

pub use config::{IndexPolicy, WalConfig, DEFAULT_MAX_SEGMENT_BYTES};
pub use entry::{EntryType, WalEntry, FRAME_HEADER_LEN, FRAME_PREFIX_LEN};
pub use io::{FileIo, StdFileIo};
pub use logging::init_logging;
pub use reader::FrameReader;
pub use segment::{parse_base_offset, segment_file_name, Segment};
pub use types::{EntryIndex, Generation, Result, SedgeError};
pub use wal::{Wal, WalStats};
