//! Outcome summaries returned by save and load.

use std::path::PathBuf;

/// What a committed save contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    /// Live entities whose frame was written.
    pub written: usize,
    /// Live entities considered for this save.
    pub total: usize,
    /// Cached dead-data frames written back unchanged.
    pub passthrough: usize,
    /// Identities of live entities that failed and were left out.
    pub failed: Vec<String>,
    /// File size in bytes.
    pub bytes: u64,
}

impl SaveReport {
    /// Whether every live entity made it into the file.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total frames in the file.
    pub fn frames(&self) -> usize {
        self.written + self.passthrough
    }
}

/// How the frames of a loaded file were routed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub path: PathBuf,
    /// Frames read from the file.
    pub frames: usize,
    /// Frames handed to a live entity.
    pub dispatched: usize,
    /// Frames kept in the dead-data cache.
    pub cached: usize,
    /// Live entities told that no data was found for them.
    pub defaulted: usize,
    /// Frames dropped because an earlier frame had the same identity.
    pub ignored: usize,
    /// Identities whose restore failed.
    pub failed: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.ignored == 0
    }
}
