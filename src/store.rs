//! RLE volume store - owns the grid of run lines and hands out iterators

use crate::error::{Result, VolumeError};
use crate::iter::{ReadIterator, WriteIterator};
use crate::layout::VolumeIndex;
use crate::run_line::{Run, RunLine};
use crate::stats::StoreStats;
use crate::types::{Index3, Pixel, Region, Size3};
use log::debug;
use ndarray::{Array2, Array3, ArrayView1};

/// Create a `width x height x depth` store filled with `initial`
pub fn create_store<P: Pixel>(
    width: usize,
    height: usize,
    depth: usize,
    initial: P,
) -> Result<RleStore<P>> {
    RleStore::new([width, height, depth], initial)
}

/// Run-length encoded 3-D volume
///
/// Every `(y, z)` of the buffered region owns one [`RunLine`] along x. Lines
/// are kept in a `[slice, row]` grid and are only ever mutated in place.
#[derive(Debug, Clone)]
pub struct RleStore<P> {
    index: VolumeIndex,
    lines: Array2<RunLine<P>>,
}

impl<P: Pixel> RleStore<P> {
    /// Store covering the whole volume, every voxel set to `initial`
    pub fn new(extent: Size3, initial: P) -> Result<Self> {
        Self::with_index(VolumeIndex::new(extent)?, initial)
    }

    /// Store holding only the buffered region of `index`
    pub fn with_index(index: VolumeIndex, initial: P) -> Result<Self> {
        let line = RunLine::new(index.line_width(), initial)?;
        let lines = Array2::from_elem((index.slices(), index.rows()), line);
        debug!("created RLE store: {}", index.summary());
        Ok(Self { index, lines })
    }

    /// Encode a dense `[z, y, x]` array into a store covering the same extent
    pub fn from_dense(volume: &Array3<P>) -> Result<Self> {
        let (depth, height, width) = volume.dim();
        let index = VolumeIndex::new([width, height, depth])?;

        let mut rows = Vec::with_capacity(height * depth);
        for slice in volume.outer_iter() {
            for row in slice.outer_iter() {
                rows.push(encode_row(row)?);
            }
        }
        let lines = Array2::from_shape_vec((depth, height), rows)?;

        let store = Self { index, lines };
        debug!(
            "encoded dense volume {}x{}x{} into {} runs",
            width,
            height,
            depth,
            store.run_count()
        );
        Ok(store)
    }

    /// Decode the buffered region into a dense `[z, y, x]` array
    pub fn to_dense(&self) -> Result<Array3<P>> {
        let size = self.index.buffered_region().size;
        let mut values = Vec::with_capacity(size.iter().product());
        for line in self.lines.iter() {
            values.extend(line.iter());
        }
        Ok(Array3::from_shape_vec((size[2], size[1], size[0]), values)?)
    }

    /// Geometry of the store
    pub fn index(&self) -> &VolumeIndex {
        &self.index
    }

    pub fn extent(&self) -> Size3 {
        self.index.extent()
    }

    pub fn buffered_region(&self) -> Region {
        self.index.buffered_region()
    }

    /// Run line holding row `y` of slice `z`
    pub fn line(&self, y: usize, z: usize) -> Result<&RunLine<P>> {
        let origin = self.index.buffered_region().index;
        let position = self.index.locate(&[origin[0], y, z])?;
        Ok(&self.lines[position.grid_key()])
    }

    pub(crate) fn line_at(&self, key: (usize, usize)) -> &RunLine<P> {
        &self.lines[key]
    }

    pub(crate) fn line_at_mut(&mut self, key: (usize, usize)) -> &mut RunLine<P> {
        &mut self.lines[key]
    }

    /// Value of a single voxel
    pub fn get_pixel(&self, x: usize, y: usize, z: usize) -> Result<P> {
        let position = self.index.locate(&[x, y, z])?;
        self.lines[position.grid_key()].value_at(position.column)
    }

    /// Overwrite a single voxel
    pub fn set_pixel(&mut self, x: usize, y: usize, z: usize, value: P) -> Result<()> {
        let position = self.index.locate(&[x, y, z])?;
        self.lines[position.grid_key()].replace_range(
            position.column,
            position.column + 1,
            value,
        )?;
        Ok(())
    }

    /// Read-only iterator over `region`, cropped to the buffered region
    pub fn begin_read(&self, region: &Region) -> Result<ReadIterator<'_, P>> {
        ReadIterator::new(self, region)
    }

    /// Read-write iterator over `region`, cropped to the buffered region
    pub fn begin_write(&mut self, region: &Region) -> Result<WriteIterator<'_, P>> {
        WriteIterator::new(self, region)
    }

    /// Iterator over the whole buffered region
    pub fn read_all(&self) -> Result<ReadIterator<'_, P>> {
        ReadIterator::new(self, &self.buffered_region())
    }

    /// Set every voxel of `region` to `value`, one range replacement per line
    pub fn fill_region(&mut self, region: &Region, value: P) -> Result<()> {
        let region = self.index.clip(region)?;
        let origin = region.index;
        for z in origin[2]..region.end(2) {
            for y in origin[1]..region.end(1) {
                let position = self.index.locate(&[origin[0], y, z])?;
                self.lines[position.grid_key()].replace_range(
                    position.column,
                    position.column + region.size[0],
                    value,
                )?;
            }
        }
        debug!("filled region {} with {:?}", region, value);
        Ok(())
    }

    /// Set every buffered voxel to `value`
    pub fn fill(&mut self, value: P) {
        for line in self.lines.iter_mut() {
            line.fill(value);
        }
    }

    /// Total number of runs over all lines
    pub fn run_count(&self) -> usize {
        self.lines.iter().map(|line| line.run_count()).sum()
    }

    /// Check every line's invariants, reporting the first broken one
    pub fn validate(&self) -> Result<()> {
        let origin = self.index.buffered_region().index;
        for ((slice, row), line) in self.lines.indexed_iter() {
            line.validate().map_err(|e| {
                VolumeError::InvariantViolation(format!(
                    "line y={} z={}: {}",
                    origin[1] + row,
                    origin[2] + slice,
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Compression statistics
    pub fn stats(&self) -> StoreStats {
        let buffered = self.index.buffered_region();
        let runs = self.run_count();
        StoreStats {
            extent: self.index.extent(),
            buffered_region: buffered,
            voxels: buffered.num_pixels(),
            lines: self.index.line_count(),
            runs,
            max_runs_per_line: self
                .lines
                .iter()
                .map(|line| line.run_count())
                .max()
                .unwrap_or(0),
            uniform_lines: self.lines.iter().filter(|line| line.is_uniform()).count(),
            dense_bytes: buffered.num_pixels() * std::mem::size_of::<P>(),
            encoded_bytes: runs * std::mem::size_of::<Run<P>>(),
        }
    }

    /// Check if a voxel is stored
    pub fn contains(&self, index: &Index3) -> bool {
        self.index.is_in_bounds(index)
    }
}

fn encode_row<P: Pixel>(row: ArrayView1<'_, P>) -> Result<RunLine<P>> {
    match row.as_slice() {
        Some(values) => RunLine::from_values(values),
        None => RunLine::from_values(&row.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_create_store() {
        let store = create_store(8, 4, 2, 0u8).unwrap();
        assert_eq!(store.extent(), [8, 4, 2]);
        assert_eq!(store.run_count(), 8);
        assert_eq!(store.get_pixel(7, 3, 1).unwrap(), 0);
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_set_and_get_pixel() {
        let mut store = create_store(4, 1, 1, 0u8).unwrap();
        store.set_pixel(1, 0, 0, 5).unwrap();
        assert_eq!(store.get_pixel(1, 0, 0).unwrap(), 5);
        assert_eq!(store.get_pixel(0, 0, 0).unwrap(), 0);
        assert_eq!(store.line(0, 0).unwrap().run_count(), 3);

        store.set_pixel(1, 0, 0, 0).unwrap();
        assert_eq!(store.line(0, 0).unwrap().run_count(), 1);
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let mut store = create_store(4, 2, 2, 0u8).unwrap();
        assert!(matches!(
            store.get_pixel(4, 0, 0),
            Err(VolumeError::OutOfBounds(_))
        ));
        assert!(matches!(
            store.set_pixel(0, 0, 2, 1),
            Err(VolumeError::OutOfBounds(_))
        ));
        assert!(store.line(2, 0).is_err());
    }

    #[test]
    fn test_buffered_sub_region() {
        let index = VolumeIndex::new([10, 10, 10])
            .unwrap()
            .with_buffered_region(Region::new([2, 3, 4], [5, 2, 1]).unwrap())
            .unwrap();
        let mut store = RleStore::with_index(index, 7u16).unwrap();
        assert_eq!(store.run_count(), 2);
        assert_eq!(store.get_pixel(2, 3, 4).unwrap(), 7);
        assert!(store.get_pixel(0, 0, 0).is_err());

        store.set_pixel(6, 4, 4, 1).unwrap();
        assert_eq!(store.line(4, 4).unwrap().decode(), vec![7, 7, 7, 7, 1]);
        assert!(store.contains(&[6, 4, 4]));
        assert!(!store.contains(&[7, 4, 4]));
    }

    #[test]
    fn test_dense_round_trip() {
        let volume = Array3::from_shape_fn((3, 4, 5), |(z, y, x)| ((x / 2 + y * z) % 3) as u8);
        let store = RleStore::from_dense(&volume).unwrap();
        assert_eq!(store.extent(), [5, 4, 3]);
        assert!(store.validate().is_ok());
        assert_eq!(store.to_dense().unwrap(), volume);
        assert_eq!(store.get_pixel(3, 2, 1).unwrap(), volume[[1, 2, 3]]);
    }

    #[test]
    fn test_dense_from_non_contiguous_view() {
        let volume = Array3::from_shape_fn((2, 3, 4), |(z, y, x)| (x + y + z) as i32);
        let transposed = volume.reversed_axes();
        assert!(!transposed.is_standard_layout());
        let store = RleStore::from_dense(&transposed).unwrap();
        assert_eq!(store.to_dense().unwrap(), transposed);
    }

    #[test]
    fn test_fill_region() {
        let mut store = create_store(6, 3, 2, 0u8).unwrap();
        let region = Region::new([1, 1, 0], [3, 2, 2]).unwrap();
        store.fill_region(&region, 9).unwrap();

        assert_eq!(store.line(0, 0).unwrap().decode(), vec![0; 6]);
        assert_eq!(store.line(1, 1).unwrap().decode(), vec![0, 9, 9, 9, 0, 0]);
        assert_eq!(store.line(2, 0).unwrap().run_count(), 3);
        assert!(store.validate().is_ok());

        // Requests hanging over the edge are cropped.
        let overhang = Region::new([4, 0, 0], [10, 1, 1]).unwrap();
        store.fill_region(&overhang, 9).unwrap();
        assert_eq!(store.line(0, 0).unwrap().decode(), vec![0, 0, 0, 0, 9, 9]);
    }

    #[test]
    fn test_fill_region_outside_fails() {
        let mut store = create_store(6, 3, 2, 0u8).unwrap();
        let outside = Region::new([0, 5, 0], [1, 1, 1]).unwrap();
        assert!(matches!(
            store.fill_region(&outside, 1),
            Err(VolumeError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_stats() {
        let mut store = create_store(100, 10, 10, 0u32).unwrap();
        store.set_pixel(50, 5, 5, 1).unwrap();
        let stats = store.stats();
        assert_eq!(stats.voxels, 10_000);
        assert_eq!(stats.lines, 100);
        assert_eq!(stats.runs, 102);
        assert_eq!(stats.max_runs_per_line, 3);
        assert_eq!(stats.uniform_lines, 99);
        assert!(stats.compression_ratio() > 1.0);
    }
}
