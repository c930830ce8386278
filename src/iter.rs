//! Region iterators over an RLE store
//!
//! [`RegionIterator`] walks a region voxel by voxel in x, then y, then z
//! order without decoding any line. It only tracks which run covers the
//! current column and how many pixels of that run remain inside the region,
//! so a step inside a run is O(1) and only moving to another line pays for a
//! binary search.
//!
//! The same type serves reading and writing: it is generic over a
//! [`StoreAccess`] capability. Built on `&RleStore` it is a [`ReadIterator`];
//! built on `&mut RleStore` it is a [`WriteIterator`] and gains
//! [`RegionIterator::set_value`].

use crate::cursor::{LineWindow, RegionCursor};
use crate::error::{Result, VolumeError};
use crate::run_line::RunLine;
use crate::store::RleStore;
use crate::types::{Index3, Pixel, Region};

/// Read access to a store
pub trait StoreAccess {
    type Pixel: Pixel;

    fn store(&self) -> &RleStore<Self::Pixel>;
}

/// Write access to a store
pub trait StoreAccessMut: StoreAccess {
    fn store_mut(&mut self) -> &mut RleStore<Self::Pixel>;
}

impl<'a, P: Pixel> StoreAccess for &'a RleStore<P> {
    type Pixel = P;

    fn store(&self) -> &RleStore<P> {
        self
    }
}

impl<'a, P: Pixel> StoreAccess for &'a mut RleStore<P> {
    type Pixel = P;

    fn store(&self) -> &RleStore<P> {
        self
    }
}

impl<'a, P: Pixel> StoreAccessMut for &'a mut RleStore<P> {
    fn store_mut(&mut self) -> &mut RleStore<P> {
        self
    }
}

/// Read-only region iterator
pub type ReadIterator<'a, P> = RegionIterator<&'a RleStore<P>>;

/// Read-write region iterator
pub type WriteIterator<'a, P> = RegionIterator<&'a mut RleStore<P>>;

/// Where an iterator stands relative to its region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// One before the first voxel; only reachable by retreating
    BeforeBegin,
    /// On a voxel of the region
    Positioned,
    /// One past the last voxel
    AtEnd,
}

/// Iterator over a region of an [`RleStore`]
///
/// Read iterators are `Clone`; clones walk independently.
#[derive(Clone)]
pub struct RegionIterator<A: StoreAccess> {
    access: A,
    cursor: RegionCursor,
    position: Position,
    index: Index3,
    window: LineWindow,
    /// Run covering the current column
    run: usize,
    /// Pixels of `run` after the current one that are still inside the region
    remaining: usize,
}

impl<A: StoreAccess> RegionIterator<A> {
    /// Iterator positioned on the first voxel of `region`
    pub fn new(access: A, region: &Region) -> Result<Self> {
        let cursor = RegionCursor::new(access.store().index(), region)?;
        Ok(Self::resume(access, cursor, Position::Positioned, cursor.region().index))
    }

    /// Rebuild iterator state from scratch at `index`
    fn resume(access: A, cursor: RegionCursor, position: Position, index: Index3) -> Self {
        let window = cursor.resolve(access.store(), index[1], index[2]);
        let mut it = Self {
            access,
            cursor,
            position,
            index,
            window,
            run: window.run_begin,
            remaining: 0,
        };
        if position == Position::Positioned {
            it.seek(index[0]);
        }
        it
    }

    /// The region being traversed, after cropping
    pub fn region(&self) -> Region {
        self.cursor.region()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// True once the iterator moved past the last voxel
    pub fn at_end(&self) -> bool {
        self.position == Position::AtEnd
    }

    /// Current voxel coordinate
    pub fn coordinate(&self) -> Option<Index3> {
        match self.position {
            Position::Positioned => Some(self.index),
            _ => None,
        }
    }

    /// Value of the current voxel
    pub fn value(&self) -> Option<A::Pixel> {
        match self.position {
            Position::Positioned => Some(self.line().run_value(self.run)),
            _ => None,
        }
    }

    /// Index of the run covering the current voxel
    pub fn run_index(&self) -> usize {
        self.run
    }

    /// Pixels of the current run still ahead inside the region
    pub fn remaining_in_run(&self) -> usize {
        self.remaining
    }

    /// Run window `begin..end` of the current line
    pub fn line_runs(&self) -> (usize, usize) {
        (self.window.run_begin, self.window.run_end)
    }

    /// Jump to the first voxel of the region
    pub fn go_to_begin(&mut self) {
        let first = self.cursor.region().index;
        self.enter_line(first[1], first[2]);
        self.seek(first[0]);
    }

    /// Jump to the last voxel of the region
    pub fn go_to_reverse_begin(&mut self) {
        let last = self.cursor.region().last_index();
        self.enter_line(last[1], last[2]);
        self.seek(last[0]);
    }

    /// Jump to an arbitrary voxel of the region
    pub fn go_to(&mut self, index: Index3) -> Result<()> {
        if !self.cursor.region().contains(&index) {
            return Err(VolumeError::OutOfBounds(format!(
                "voxel {:?} outside iterator region {}",
                index,
                self.cursor.region()
            )));
        }
        self.enter_line(index[1], index[2]);
        self.seek(index[0]);
        Ok(())
    }

    /// Step to the next voxel, wrapping to the next row and slice of the region
    pub fn advance(&mut self) {
        match self.position {
            Position::AtEnd => return,
            Position::BeforeBegin => {
                self.go_to_begin();
                return;
            }
            Position::Positioned => {}
        }

        if self.remaining > 0 {
            self.remaining -= 1;
            self.index[0] += 1;
            return;
        }

        self.run += 1;
        if self.run < self.window.run_end {
            self.index[0] += 1;
            let column = self.cursor.column_of(self.index[0]);
            let line = self.access.store().line_at(self.window.key);
            self.remaining = line.run_end(self.run).min(self.window.end_column) - column - 1;
            return;
        }

        match self.cursor.next_line(self.index[1], self.index[2]) {
            Some((y, z)) => {
                self.enter_line(y, z);
                self.seek(self.cursor.region().index[0]);
            }
            None => self.position = Position::AtEnd,
        }
    }

    /// Step to the previous voxel, wrapping to the previous row and slice
    pub fn retreat(&mut self) {
        match self.position {
            Position::BeforeBegin => return,
            Position::AtEnd => {
                self.go_to_reverse_begin();
                return;
            }
            Position::Positioned => {}
        }

        let column = self.cursor.column_of(self.index[0]);
        let lower = self
            .line()
            .run_start(self.run)
            .max(self.window.begin_column);
        if column > lower {
            self.index[0] -= 1;
            self.remaining += 1;
            return;
        }

        if self.run > self.window.run_begin {
            self.run -= 1;
            self.remaining = 0;
            self.index[0] -= 1;
            return;
        }

        match self.cursor.prev_line(self.index[1], self.index[2]) {
            Some((y, z)) => {
                self.enter_line(y, z);
                self.seek(self.cursor.region().last_index()[0]);
            }
            None => self.position = Position::BeforeBegin,
        }
    }

    /// Consume the iterator into a std iterator of `(coordinate, value)`
    pub fn into_pixels(self) -> Pixels<A> {
        Pixels { inner: self }
    }

    fn line(&self) -> &RunLine<A::Pixel> {
        self.access.store().line_at(self.window.key)
    }

    fn enter_line(&mut self, y: usize, z: usize) {
        self.window = self.cursor.resolve(self.access.store(), y, z);
        self.index[1] = y;
        self.index[2] = z;
    }

    /// Position on column `x` of the current line
    fn seek(&mut self, x: usize) {
        let column = self.cursor.column_of(x);
        let line = self.access.store().line_at(self.window.key);
        let run = line.run_containing(column);
        self.remaining = line.run_end(run).min(self.window.end_column) - column - 1;
        self.run = run;
        self.index[0] = x;
        self.position = Position::Positioned;
    }
}

impl<A: StoreAccessMut> RegionIterator<A> {
    /// Overwrite the current voxel.
    ///
    /// The current line is re-encoded in place and this iterator's run state
    /// is re-derived for it; any other iterator on the same store would be
    /// stale, which the exclusive borrow rules out.
    pub fn set_value(&mut self, value: A::Pixel) -> Result<()> {
        if self.position != Position::Positioned {
            return Err(VolumeError::OutOfBounds(format!(
                "cannot write while iterator is {:?} of region {}",
                self.position,
                self.cursor.region()
            )));
        }

        let column = self.cursor.column_of(self.index[0]);
        let key = self.window.key;
        let run = self
            .access
            .store_mut()
            .line_at_mut(key)
            .replace_range(column, column + 1, value)?;

        let line = self.access.store().line_at(key);
        self.run = run;
        self.remaining = line.run_end(run).min(self.window.end_column) - column - 1;
        self.window.run_begin = line.run_containing(self.window.begin_column);
        self.window.run_end = line.run_containing(self.window.end_column - 1) + 1;
        Ok(())
    }
}

impl<'a, P: Pixel> RegionIterator<&'a mut RleStore<P>> {
    /// Give up write access, keeping the current position
    pub fn into_read(self) -> ReadIterator<'a, P> {
        let RegionIterator {
            access,
            cursor,
            position,
            index,
            ..
        } = self;
        let store: &'a RleStore<P> = access;
        RegionIterator::resume(store, cursor, position, index)
    }

    /// Read-only iterator at the same position, borrowing this one
    pub fn as_read(&self) -> ReadIterator<'_, P> {
        RegionIterator::resume(&*self.access, self.cursor, self.position, self.index)
    }
}

/// `(coordinate, value)` pairs of the remaining voxels of a region
pub struct Pixels<A: StoreAccess> {
    inner: RegionIterator<A>,
}

impl<A: StoreAccess> Iterator for Pixels<A> {
    type Item = (Index3, A::Pixel);

    fn next(&mut self) -> Option<Self::Item> {
        let item = (self.inner.coordinate()?, self.inner.value()?);
        self.inner.advance();
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_store;

    fn numbered_store(size: [usize; 3]) -> RleStore<u32> {
        let mut store = RleStore::new(size, 0u32).unwrap();
        let region = store.buffered_region();
        let mut it = store.begin_write(&region).unwrap();
        let mut n = 0u32;
        while !it.at_end() {
            // Pairs of equal values so runs have length 2
            it.set_value(n / 2).unwrap();
            n += 1;
            it.advance();
        }
        store
    }

    #[test]
    fn test_full_traversal_order() {
        let store = create_store(3, 2, 2, 1u8).unwrap();
        let coords: Vec<_> = store
            .read_all()
            .unwrap()
            .into_pixels()
            .map(|(c, _)| c)
            .collect();
        assert_eq!(coords.len(), 12);
        assert_eq!(coords[0], [0, 0, 0]);
        assert_eq!(coords[2], [2, 0, 0]);
        assert_eq!(coords[3], [0, 1, 0]);
        assert_eq!(coords[6], [0, 0, 1]);
        assert_eq!(coords[11], [2, 1, 1]);
    }

    #[test]
    fn test_sub_region_wraps_at_region_edges() {
        let store = numbered_store([6, 4, 3]);
        let region = Region::new([1, 1, 1], [3, 2, 2]).unwrap();
        let pixels: Vec<_> = store.begin_read(&region).unwrap().into_pixels().collect();

        assert_eq!(pixels.len(), 12);
        let expected: Vec<Index3> = (1..3)
            .flat_map(|z| (1..3).flat_map(move |y| (1..4).map(move |x| [x, y, z])))
            .collect();
        let coords: Vec<_> = pixels.iter().map(|(c, _)| *c).collect();
        assert_eq!(coords, expected);

        for (c, v) in pixels {
            assert_eq!(v, store.get_pixel(c[0], c[1], c[2]).unwrap());
        }
    }

    #[test]
    fn test_remaining_is_clipped_to_region() {
        let store = create_store(10, 1, 1, 0u8).unwrap();
        let region = Region::new([2, 0, 0], [3, 1, 1]).unwrap();
        let mut it = store.begin_read(&region).unwrap();
        assert_eq!(it.line_runs(), (0, 1));
        assert_eq!(it.remaining_in_run(), 2);
        it.advance();
        it.advance();
        assert_eq!(it.coordinate(), Some([4, 0, 0]));
        assert_eq!(it.remaining_in_run(), 0);
        it.advance();
        assert!(it.at_end());
        assert_eq!(it.value(), None);
    }

    #[test]
    fn test_retreat_from_end_and_before_begin() {
        let store = numbered_store([4, 2, 1]);
        let mut it = store.read_all().unwrap();

        it.retreat();
        assert_eq!(it.position(), Position::BeforeBegin);
        assert_eq!(it.coordinate(), None);
        it.advance();
        assert_eq!(it.coordinate(), Some([0, 0, 0]));

        while !it.at_end() {
            it.advance();
        }
        it.retreat();
        assert_eq!(it.coordinate(), Some([3, 1, 0]));
        assert_eq!(it.value(), Some(3));
        it.retreat();
        assert_eq!(it.coordinate(), Some([2, 1, 0]));
        it.retreat();
        assert_eq!(it.coordinate(), Some([1, 1, 0]));
        assert_eq!(it.value(), Some(2));
    }

    #[test]
    fn test_retreat_wraps_between_rows_and_slices() {
        let store = numbered_store([5, 3, 3]);
        let region = Region::new([1, 1, 1], [2, 2, 2]).unwrap();
        let mut it = store.begin_read(&region).unwrap();
        it.go_to([1, 1, 2]).unwrap();
        it.retreat();
        assert_eq!(it.coordinate(), Some([2, 2, 1]));
        it.retreat();
        it.retreat();
        assert_eq!(it.coordinate(), Some([2, 1, 1]));
        assert_eq!(it.value(), Some(store.get_pixel(2, 1, 1).unwrap()));
    }

    #[test]
    fn test_go_to() {
        let store = numbered_store([8, 2, 2]);
        let mut it = store.read_all().unwrap();
        it.go_to([5, 1, 1]).unwrap();
        assert_eq!(it.value(), Some(store.get_pixel(5, 1, 1).unwrap()));
        assert!(matches!(
            it.go_to([8, 0, 0]),
            Err(VolumeError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_set_value_updates_run_state() {
        let mut store = create_store(4, 1, 1, 0u8).unwrap();
        let region = store.buffered_region();
        let mut it = store.begin_write(&region).unwrap();
        it.advance();
        it.set_value(5).unwrap();
        assert_eq!(it.value(), Some(5));
        assert_eq!(it.run_index(), 1);
        assert_eq!(it.remaining_in_run(), 0);
        assert_eq!(it.line_runs(), (0, 3));

        it.advance();
        assert_eq!(it.coordinate(), Some([2, 0, 0]));
        assert_eq!(it.value(), Some(0));
        assert_eq!(it.remaining_in_run(), 1);

        it.retreat();
        it.set_value(0).unwrap();
        assert_eq!(it.line_runs(), (0, 1));
        assert_eq!(it.remaining_in_run(), 2);
        drop(it);
        assert_eq!(store.line(0, 0).unwrap().run_count(), 1);
    }

    #[test]
    fn test_set_value_outside_region_fails() {
        let mut store = create_store(2, 1, 1, 0u8).unwrap();
        let region = store.buffered_region();
        let mut it = store.begin_write(&region).unwrap();
        it.advance();
        it.advance();
        assert!(it.at_end());
        assert!(matches!(
            it.set_value(1),
            Err(VolumeError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_write_then_read_conversions() {
        let mut store = create_store(4, 2, 1, 0u8).unwrap();
        let region = store.buffered_region();
        let mut it = store.begin_write(&region).unwrap();
        it.go_to([2, 1, 0]).unwrap();
        it.set_value(9).unwrap();

        let peek = it.as_read();
        assert_eq!(peek.coordinate(), Some([2, 1, 0]));
        assert_eq!(peek.value(), Some(9));

        let mut read = it.into_read();
        assert_eq!(read.value(), Some(9));
        read.advance();
        assert_eq!(read.value(), Some(0));
        assert_eq!(read.line_runs(), (0, 3));
    }

    #[test]
    fn test_cloned_readers_are_independent() {
        let store = numbered_store([4, 1, 1]);
        let mut a = store.read_all().unwrap();
        let b = a.clone();
        a.advance();
        a.advance();
        assert_eq!(a.value(), Some(1));
        assert_eq!(b.value(), Some(0));
    }

    #[test]
    fn test_region_request_errors() {
        let store = create_store(4, 4, 4, 0u8).unwrap();
        let outside = Region::new([4, 0, 0], [2, 2, 2]).unwrap();
        assert!(matches!(
            store.begin_read(&outside),
            Err(VolumeError::OutOfBounds(_))
        ));
        let empty = Region {
            index: [0, 0, 0],
            size: [0, 1, 1],
        };
        assert!(matches!(
            store.begin_read(&empty),
            Err(VolumeError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_overflowing_region_is_rejected() {
        let mut store = create_store(4, 4, 4, 0u8).unwrap();
        let wrapping = Region {
            index: [usize::MAX, 0, 0],
            size: [2, 1, 1],
        };
        assert!(matches!(
            store.begin_read(&wrapping),
            Err(VolumeError::InvalidRegion(_))
        ));
        assert!(matches!(
            store.begin_write(&wrapping),
            Err(VolumeError::InvalidRegion(_))
        ));
        assert!(matches!(
            store.fill_region(&wrapping, 1),
            Err(VolumeError::InvalidRegion(_))
        ));
    }
}
