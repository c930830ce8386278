//! Region resolution - maps a region onto per-line column and run windows

use crate::error::{Result, VolumeError};
use crate::layout::VolumeIndex;
use crate::store::RleStore;
use crate::types::{Pixel, Region};
use log::trace;

/// The part of one run line that lies inside a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWindow {
    /// `[slice, row]` key of the line in the store grid
    pub key: (usize, usize),
    /// First column inside the region
    pub begin_column: usize,
    /// One past the last column inside the region
    pub end_column: usize,
    /// Run covering `begin_column`
    pub run_begin: usize,
    /// One past the run covering `end_column - 1`
    pub run_end: usize,
}

/// A region already cropped to a store's buffered region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionCursor {
    region: Region,
    index: VolumeIndex,
}

impl RegionCursor {
    /// Crop `request` against the buffered region of `index`
    pub fn new(index: &VolumeIndex, request: &Region) -> Result<Self> {
        Ok(Self {
            region: index.clip(request)?,
            index: *index,
        })
    }

    /// The cropped region
    pub fn region(&self) -> Region {
        self.region
    }

    /// Window of row `y`, slice `z` of the region
    pub fn window<P: Pixel>(&self, store: &RleStore<P>, y: usize, z: usize) -> Result<LineWindow> {
        let r = &self.region;
        if y < r.index[1] || y >= r.end(1) || z < r.index[2] || z >= r.end(2) {
            return Err(VolumeError::OutOfBounds(format!(
                "line y={} z={} outside region {}",
                y, z, r
            )));
        }
        Ok(self.resolve(store, y, z))
    }

    /// All windows of the region in traversal order
    pub fn windows<'s, P: Pixel>(
        &'s self,
        store: &'s RleStore<P>,
    ) -> impl Iterator<Item = LineWindow> + 's {
        let r = self.region;
        (r.index[2]..r.end(2))
            .flat_map(move |z| (r.index[1]..r.end(1)).map(move |y| (y, z)))
            .map(move |(y, z)| self.resolve(store, y, z))
    }

    /// Window resolution for a line known to lie inside the region
    pub(crate) fn resolve<P: Pixel>(&self, store: &RleStore<P>, y: usize, z: usize) -> LineWindow {
        let origin = self.index.buffered_region().index;
        let key = (z - origin[2], y - origin[1]);
        let begin_column = self.region.index[0] - origin[0];
        let end_column = begin_column + self.region.size[0];

        let line = store.line_at(key);
        let run_begin = line.run_containing(begin_column);
        let run_end = line.run_containing(end_column - 1) + 1;
        trace!(
            "resolved line y={} z={}: columns {}..{}, runs {}..{}",
            y,
            z,
            begin_column,
            end_column,
            run_begin,
            run_end
        );

        LineWindow {
            key,
            begin_column,
            end_column,
            run_begin,
            run_end,
        }
    }

    /// Line following `(y, z)` in traversal order
    pub fn next_line(&self, y: usize, z: usize) -> Option<(usize, usize)> {
        let r = &self.region;
        if y + 1 < r.end(1) {
            Some((y + 1, z))
        } else if z + 1 < r.end(2) {
            Some((r.index[1], z + 1))
        } else {
            None
        }
    }

    /// Line preceding `(y, z)` in traversal order
    pub fn prev_line(&self, y: usize, z: usize) -> Option<(usize, usize)> {
        let r = &self.region;
        if y > r.index[1] {
            Some((y - 1, z))
        } else if z > r.index[2] {
            Some((r.end(1) - 1, z - 1))
        } else {
            None
        }
    }

    /// Column of volume coordinate `x` inside its run line
    pub(crate) fn column_of(&self, x: usize) -> usize {
        x - self.index.buffered_region().index[0]
    }
}
