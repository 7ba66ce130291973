//! Frame decoding at arbitrary file offsets.

use crate::entry::{EntryType, WalEntry, FRAME_HEADER_LEN, FRAME_PREFIX_LEN};
use crate::io::FileIo;
use crate::types::{EntryIndex, Generation, Result, SedgeError};

/// Reads length-prefixed record frames from an open file.
///
/// Decoding is blocking: short reads from the underlying storage are
/// retried inside [`FileIo::read_at`] until the requested byte count is
/// satisfied or end-of-file is reached. The declared frame size is checked
/// against the file length before any payload read, so a frame that claims
/// bytes past end-of-file fails with [`SedgeError::CorruptFrame`] instead
/// of a partial record.
pub struct FrameReader<'a> {
    io: &'a dyn FileIo,
}

impl<'a> FrameReader<'a> {
    /// Reader over `io`.
    pub fn new(io: &'a dyn FileIo) -> Self {
        Self { io }
    }

    /// Decodes the frame starting at `offset`.
    pub fn read_frame(&self, offset: u64) -> Result<WalEntry> {
        let file_len = self.io.len()?;
        let header_start = offset + FRAME_PREFIX_LEN as u64;
        if header_start > file_len {
            return Err(SedgeError::CorruptFrame(
                "frame size prefix extends past end of file",
            ));
        }

        let mut prefix = [0u8; FRAME_PREFIX_LEN];
        self.io.read_at(offset, &mut prefix)?;
        let frame_size = u32::from_be_bytes(prefix);
        if (frame_size as usize) < FRAME_HEADER_LEN {
            return Err(SedgeError::CorruptFrame(
                "declared frame size smaller than fixed header",
            ));
        }
        if header_start + frame_size as u64 > file_len {
            return Err(SedgeError::CorruptFrame(
                "frame extends past end of file",
            ));
        }

        let mut header = [0u8; FRAME_HEADER_LEN];
        self.io.read_at(header_start, &mut header)?;
        let tag = u32::from_be_bytes(header[0..4].try_into().unwrap());
        let entry_type = EntryType::try_from(tag)?;
        let generation = u64::from_be_bytes(header[4..12].try_into().unwrap());
        let index = u64::from_be_bytes(header[12..20].try_into().unwrap());
        let timestamp_ms = u64::from_be_bytes(header[20..28].try_into().unwrap());

        let payload_len = frame_size as usize - FRAME_HEADER_LEN;
        let mut payload = vec![0u8; payload_len];
        if payload_len > 0 {
            self.io
                .read_at(header_start + FRAME_HEADER_LEN as u64, &mut payload)?;
        }

        Ok(WalEntry::from_parts(
            EntryIndex(index),
            Generation(generation),
            timestamp_ms,
            entry_type,
            payload,
        ))
    }
}
