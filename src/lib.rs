//! rle-volume - Run-length encoded 3-D label volumes
//!
//! An in-memory raster store for scalar or label volumes that keeps every
//! scanline run-length encoded, with region iterators that read and write
//! voxels without ever decoding the volume.
//!
//! # Features
//!
//! - One [`RunLine`] per `(y, z)`: maximal `(length, value)` runs along x
//! - Single-voxel random access with O(log R) run lookup
//! - Region iterators that wrap across rows and slices of a sub-box, stepping
//!   forward or backward in amortized O(1) per voxel
//! - In-place writes that split and merge runs, keeping every line maximal
//! - Region fills, dense `ndarray` import/export and brush painting
//!
//! # Example
//!
//! ```rust
//! use rle_volume::{create_store, Region};
//!
//! # fn example() -> rle_volume::Result<()> {
//! let mut store = create_store(64, 64, 16, 0u8)?;
//! store.set_pixel(10, 20, 3, 7)?;
//!
//! let region = Region::new([8, 20, 3], [4, 1, 1])?;
//! let values: Vec<u8> = store
//!     .begin_read(&region)?
//!     .into_pixels()
//!     .map(|(_, v)| v)
//!     .collect();
//! assert_eq!(values, vec![0, 0, 7, 0]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod cursor;
pub mod error;
pub mod iter;
pub mod layout;
pub mod paint;
pub mod run_line;
pub mod stats;
pub mod store;
pub mod types;

// Re-exports
pub use cursor::{LineWindow, RegionCursor};
pub use error::{Result, VolumeError};
pub use iter::{
    Pixels, Position, ReadIterator, RegionIterator, StoreAccess, StoreAccessMut, WriteIterator,
};
pub use layout::{LinePosition, VolumeIndex};
pub use paint::{Brush, BrushShape, CoverageMode, PaintSettings, Paintbrush};
pub use run_line::{Run, RunLine};
pub use stats::StoreStats;
pub use store::{create_store, RleStore};
pub use types::{Axis, Index3, Pixel, Region, Size3};

/// Version of the crate
pub const RLE_VOLUME_VERSION: &str = env!("CARGO_PKG_VERSION");
