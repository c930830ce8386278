//! Volume geometry - extents, buffered region and coordinate to line mapping

use crate::error::{Result, VolumeError};
use crate::types::{Index3, Region, Size3};
use serde::{Deserialize, Serialize};

/// Position of a voxel inside the run line grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinePosition {
    /// Row of the line, relative to the buffered region
    pub row: usize,
    /// Slice of the line, relative to the buffered region
    pub slice: usize,
    /// Column inside the line
    pub column: usize,
}

impl LinePosition {
    /// Key into the `[slice, row]` line grid
    pub fn grid_key(&self) -> (usize, usize) {
        (self.slice, self.row)
    }
}

/// Geometric bookkeeping of a volume
///
/// The volume spans `[0, extent)` on every axis. Only the buffered region
/// holds run lines; every access is checked against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeIndex {
    extent: Size3,
    buffered: Region,
}

impl VolumeIndex {
    /// Index for a volume whose buffered region is the whole volume
    pub fn new(extent: Size3) -> Result<Self> {
        if extent.iter().any(|&e| e == 0) {
            return Err(VolumeError::InvalidDimensions(format!(
                "volume extent {:?} has a zero axis",
                extent
            )));
        }
        if extent[0] > u32::MAX as usize {
            return Err(VolumeError::InvalidDimensions(format!(
                "volume width {} exceeds the maximum run length {}",
                extent[0],
                u32::MAX
            )));
        }
        let buffered = Region::from_size(extent)?;
        Ok(Self { extent, buffered })
    }

    /// Restrict storage to a sub-region of the volume
    pub fn with_buffered_region(mut self, region: Region) -> Result<Self> {
        region.validate()?;
        if !self.largest_region().contains_region(&region) {
            return Err(VolumeError::OutOfBounds(format!(
                "buffered region {} exceeds volume extent {:?}",
                region, self.extent
            )));
        }
        self.buffered = region;
        Ok(self)
    }

    /// Full volume extent
    pub fn extent(&self) -> Size3 {
        self.extent
    }

    /// Region covering the whole volume
    pub fn largest_region(&self) -> Region {
        Region {
            index: [0; 3],
            size: self.extent,
        }
    }

    pub fn buffered_region(&self) -> Region {
        self.buffered
    }

    /// Pixels per run line
    pub fn line_width(&self) -> usize {
        self.buffered.size[0]
    }

    /// Rows per slice of the line grid
    pub fn rows(&self) -> usize {
        self.buffered.size[1]
    }

    /// Slices of the line grid
    pub fn slices(&self) -> usize {
        self.buffered.size[2]
    }

    /// Total number of run lines
    pub fn line_count(&self) -> usize {
        self.rows() * self.slices()
    }

    /// Check if a voxel is inside the buffered region
    pub fn is_in_bounds(&self, index: &Index3) -> bool {
        self.buffered.contains(index)
    }

    /// Map a volume coordinate to its run line position
    pub fn locate(&self, index: &Index3) -> Result<LinePosition> {
        if !self.is_in_bounds(index) {
            return Err(VolumeError::OutOfBounds(format!(
                "voxel {:?} outside buffered region {}",
                index, self.buffered
            )));
        }
        let origin = self.buffered.index;
        Ok(LinePosition {
            row: index[1] - origin[1],
            slice: index[2] - origin[2],
            column: index[0] - origin[0],
        })
    }

    /// Inverse of [`VolumeIndex::locate`]
    pub fn to_index(&self, position: &LinePosition) -> Index3 {
        let origin = self.buffered.index;
        [
            origin[0] + position.column,
            origin[1] + position.row,
            origin[2] + position.slice,
        ]
    }

    /// Crop a requested region to the buffered region.
    ///
    /// A request that does not touch the buffered region at all is an error.
    pub fn clip(&self, region: &Region) -> Result<Region> {
        region.validate()?;
        region.crop(&self.buffered).ok_or_else(|| {
            VolumeError::OutOfBounds(format!(
                "region {} does not intersect buffered region {}",
                region, self.buffered
            ))
        })
    }

    /// Get a summary string of the geometry
    pub fn summary(&self) -> String {
        let size_str = self
            .extent
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" x ");

        format!(
            "Volume: {}, buffered {}, {} lines of {} pixels",
            size_str,
            self.buffered,
            self.line_count(),
            self.line_width()
        )
    }
}
