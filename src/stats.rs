//! Compression statistics of a store

use crate::error::Result;
use crate::types::{Region, Size3};
use serde::{Deserialize, Serialize};

/// Snapshot of how well a store compresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Full volume extent
    pub extent: Size3,

    /// Region backed by run lines
    pub buffered_region: Region,

    /// Voxels in the buffered region
    pub voxels: usize,

    /// Number of run lines
    pub lines: usize,

    /// Total number of runs
    pub runs: usize,

    /// Longest line, in runs
    pub max_runs_per_line: usize,

    /// Lines consisting of a single run
    pub uniform_lines: usize,

    /// Size of the buffered region as a dense array
    pub dense_bytes: usize,

    /// Size of the run payload
    pub encoded_bytes: usize,
}

impl StoreStats {
    /// Dense size divided by encoded size
    pub fn compression_ratio(&self) -> f64 {
        if self.encoded_bytes == 0 {
            0.0
        } else {
            self.dense_bytes as f64 / self.encoded_bytes as f64
        }
    }

    pub fn mean_runs_per_line(&self) -> f64 {
        if self.lines == 0 {
            0.0
        } else {
            self.runs as f64 / self.lines as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} voxels in {} lines, {} runs ({:.2} per line, max {}), {} uniform lines, {:.1}x compression",
            self.voxels,
            self.lines,
            self.runs,
            self.mean_runs_per_line(),
            self.max_runs_per_line,
            self.uniform_lines,
            self.compression_ratio()
        )
    }

    /// Pretty-printed JSON report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
