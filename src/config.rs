//! Log configuration.

use std::path::PathBuf;

use crate::types::{Result, SedgeError};

/// Default rolling threshold: 64 MiB per segment file.
pub const DEFAULT_MAX_SEGMENT_BYTES: u64 = 64 * 1024 * 1024;

/// Whether explicit-index appends must follow the last written index.
///
/// The permissive mode exists for callers that install entries at a known
/// offset (e.g. a replicated-log layer applying entries after a snapshot);
/// gap creation is then the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Accept any explicit index.
    #[default]
    Permissive,
    /// Reject explicit indices other than `last_log_index() + 1`.
    Contiguous,
}

/// Configuration consumed by [`Wal::open`](crate::wal::Wal::open).
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// Directory holding the segment files. Created if missing.
    pub dir: PathBuf,
    /// Rolling threshold in bytes: once the open segment reaches this size,
    /// the next append seals it and starts a new segment.
    pub max_segment_bytes: u64,
    /// Contiguity policy for explicit-index appends.
    pub index_policy: IndexPolicy,
}

impl WalConfig {
    /// Configuration with default threshold and the permissive index policy.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_segment_bytes: DEFAULT_MAX_SEGMENT_BYTES,
            index_policy: IndexPolicy::default(),
        }
    }

    /// Sets the rolling threshold in bytes.
    pub fn with_max_segment_bytes(mut self, max_segment_bytes: u64) -> Self {
        self.max_segment_bytes = max_segment_bytes;
        self
    }

    /// Sets the contiguity policy for explicit-index appends.
    pub fn with_index_policy(mut self, index_policy: IndexPolicy) -> Self {
        self.index_policy = index_policy;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_segment_bytes == 0 {
            return Err(SedgeError::InvalidConfig(
                "max segment size must be non-zero",
            ));
        }
        Ok(())
    }
}
