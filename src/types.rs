//! Core data types: pixel bound, axes, 3-D indices and regions

use crate::error::{Result, VolumeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3-D voxel coordinate `[x, y, z]`; x varies fastest.
pub type Index3 = [usize; 3];

/// Per-axis extent `[width, height, depth]`.
pub type Size3 = [usize; 3];

/// Values that can be stored in a run-length encoded volume.
///
/// Any small `Copy` type with equality works: label ids, intensities, flags.
pub trait Pixel: Copy + PartialEq + fmt::Debug {}

impl<T: Copy + PartialEq + fmt::Debug> Pixel for T {}

/// Axes of a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    /// Fastest varying axis (columns of a run line)
    X = 0,
    /// Rows
    Y = 1,
    /// Slices
    Z = 2,
}

impl Axis {
    /// Convert from usize index
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Axis::X),
            1 => Some(Axis::Y),
            2 => Some(Axis::Z),
            _ => None,
        }
    }

    /// Convert to usize index
    pub fn to_index(&self) -> usize {
        *self as usize
    }
}

/// An axis-aligned box of voxels: origin `index` and per-axis `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub index: Index3,
    pub size: Size3,
}

impl Region {
    /// Create a region, rejecting empty extents.
    pub fn new(index: Index3, size: Size3) -> Result<Self> {
        let region = Self { index, size };
        region.validate()?;
        Ok(region)
    }

    /// Check that every axis is non-empty and `index + size` is representable.
    ///
    /// The fields are public, so regions built as struct literals are checked
    /// here before any end coordinate is computed.
    pub fn validate(&self) -> Result<()> {
        if self.size.iter().any(|&s| s == 0) {
            return Err(VolumeError::InvalidRegion(format!(
                "region {:?} + {:?} has a zero extent",
                self.index, self.size
            )));
        }
        if self
            .index
            .iter()
            .zip(self.size.iter())
            .any(|(&i, &s)| i.checked_add(s).is_none())
        {
            return Err(VolumeError::InvalidRegion(format!(
                "region {:?} + {:?} overflows the index space",
                self.index, self.size
            )));
        }
        Ok(())
    }

    /// Region starting at the origin
    pub fn from_size(size: Size3) -> Result<Self> {
        Self::new([0; 3], size)
    }

    /// A single voxel
    pub fn voxel(index: Index3) -> Self {
        Self {
            index,
            size: [1; 3],
        }
    }

    /// Build a region from a possibly negative origin and crop it to `within`.
    ///
    /// Returns `None` when nothing of the box lies inside `within`.
    pub fn from_signed(index: [i64; 3], size: Size3, within: &Region) -> Option<Region> {
        let mut out = *within;
        for axis in 0..3 {
            let start = i128::from(index[axis]);
            let lo = start.max(within.index[axis] as i128);
            let hi = (start + size[axis] as i128).min(within.end(axis) as i128);
            if lo >= hi {
                return None;
            }
            out.index[axis] = lo as usize;
            out.size[axis] = (hi - lo) as usize;
        }
        Some(out)
    }

    /// Exclusive end coordinate along `axis`
    pub fn end(&self, axis: usize) -> usize {
        self.index[axis] + self.size[axis]
    }

    /// Coordinate of the last voxel in traversal order
    pub fn last_index(&self) -> Index3 {
        [self.end(0) - 1, self.end(1) - 1, self.end(2) - 1]
    }

    /// Total number of voxels
    pub fn num_pixels(&self) -> usize {
        self.size.iter().product()
    }

    /// Check if a voxel lies inside the region
    pub fn contains(&self, index: &Index3) -> bool {
        (0..3).all(|axis| index[axis] >= self.index[axis] && index[axis] < self.end(axis))
    }

    /// Check if `other` lies completely inside this region
    pub fn contains_region(&self, other: &Region) -> bool {
        (0..3).all(|axis| other.index[axis] >= self.index[axis] && other.end(axis) <= self.end(axis))
    }

    /// Intersection of two regions, `None` if they are disjoint.
    pub fn crop(&self, other: &Region) -> Option<Region> {
        let mut out = *self;
        for axis in 0..3 {
            let lo = self.index[axis].max(other.index[axis]);
            let hi = self.end(axis).min(other.end(axis));
            if lo >= hi {
                return None;
            }
            out.index[axis] = lo;
            out.size[axis] = hi - lo;
        }
        Some(out)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}] + [{} x {} x {}]",
            self.index[0], self.index[1], self.index[2], self.size[0], self.size[1], self.size[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_conversion() {
        assert_eq!(Axis::from_index(0), Some(Axis::X));
        assert_eq!(Axis::from_index(2), Some(Axis::Z));
        assert_eq!(Axis::from_index(3), None);
        assert_eq!(Axis::Y.to_index(), 1);
    }

    #[test]
    fn test_region_rejects_empty() {
        assert!(matches!(
            Region::new([0, 0, 0], [4, 0, 1]),
            Err(VolumeError::InvalidRegion(_))
        ));
        assert!(Region::new([usize::MAX, 0, 0], [2, 1, 1]).is_err());
    }

    #[test]
    fn test_region_crop() {
        let a = Region::new([0, 0, 0], [10, 10, 10]).unwrap();
        let b = Region::new([5, 8, 2], [10, 10, 1]).unwrap();
        let c = a.crop(&b).unwrap();
        assert_eq!(c.index, [5, 8, 2]);
        assert_eq!(c.size, [5, 2, 1]);

        let far = Region::new([20, 0, 0], [1, 1, 1]).unwrap();
        assert_eq!(a.crop(&far), None);
    }

    #[test]
    fn test_region_from_signed() {
        let bounds = Region::from_size([8, 8, 4]).unwrap();
        let r = Region::from_signed([-2, 6, 1], [5, 5, 1], &bounds).unwrap();
        assert_eq!(r.index, [0, 6, 1]);
        assert_eq!(r.size, [3, 2, 1]);
        assert_eq!(Region::from_signed([-5, 0, 0], [5, 1, 1], &bounds), None);

        let huge = Region::from_signed([i64::MIN, 2, 0], [usize::MAX, 1, 1], &bounds).unwrap();
        assert_eq!(huge.index, [0, 2, 0]);
        assert_eq!(huge.size, [8, 1, 1]);
    }

    #[test]
    fn test_region_validate() {
        assert!(Region::new([usize::MAX, 0, 0], [1, 1, 1]).is_err());
        let wrapping = Region {
            index: [usize::MAX, 0, 0],
            size: [2, 1, 1],
        };
        assert!(matches!(
            wrapping.validate(),
            Err(VolumeError::InvalidRegion(_))
        ));
        assert!(Region::voxel([3, 3, 3]).validate().is_ok());
    }

    #[test]
    fn test_region_queries() {
        let r = Region::new([1, 2, 3], [2, 3, 4]).unwrap();
        assert_eq!(r.num_pixels(), 24);
        assert_eq!(r.last_index(), [2, 4, 6]);
        assert!(r.contains(&[1, 2, 3]));
        assert!(r.contains(&[2, 4, 6]));
        assert!(!r.contains(&[3, 4, 6]));
        assert!(r.contains_region(&Region::voxel([2, 3, 4])));
        assert_eq!(r.to_string(), "[1, 2, 3] + [2 x 3 x 4]");
    }
}
