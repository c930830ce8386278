//! Run-length encoded scanlines
//!
//! A [`RunLine`] stores one row of a volume along the fastest axis as a
//! sequence of maximal `(length, value)` runs. Random access goes through a
//! cached table of cumulative run ends, so locating the run that covers a
//! column is a binary search.

use crate::error::{Result, VolumeError};
use crate::types::Pixel;
use serde::{Deserialize, Serialize};

/// `length` consecutive pixels of the same `value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run<P> {
    pub length: u32,
    pub value: P,
}

impl<P> Run<P> {
    pub fn new(length: u32, value: P) -> Self {
        Self { length, value }
    }
}

/// One compressed scanline.
///
/// Invariants, checked by [`RunLine::validate`]:
/// - run lengths sum to the line width
/// - no run has length zero
/// - adjacent runs never share a value
#[derive(Debug, Clone, PartialEq)]
pub struct RunLine<P> {
    runs: Vec<Run<P>>,
    /// `ends[i]` is the exclusive end column of `runs[i]`
    ends: Vec<usize>,
    width: usize,
}

fn check_width(width: usize) -> Result<()> {
    if width == 0 || width > u32::MAX as usize {
        return Err(VolumeError::InvalidDimensions(format!(
            "line width must be between 1 and {}, got {}",
            u32::MAX,
            width
        )));
    }
    Ok(())
}

impl<P: Pixel> RunLine<P> {
    /// A line of `width` pixels, all equal to `value`
    pub fn new(width: usize, value: P) -> Result<Self> {
        check_width(width)?;
        Ok(Self {
            runs: vec![Run::new(width as u32, value)],
            ends: vec![width],
            width,
        })
    }

    /// Encode a dense row of pixels
    pub fn from_values(values: &[P]) -> Result<Self> {
        check_width(values.len())?;

        let mut runs: Vec<Run<P>> = Vec::new();
        for &value in values {
            match runs.last_mut() {
                Some(run) if run.value == value => run.length += 1,
                _ => runs.push(Run::new(1, value)),
            }
        }

        let mut line = Self {
            runs,
            ends: Vec::new(),
            width: values.len(),
        };
        line.rebuild_ends();
        Ok(line)
    }

    /// Build a line from explicit runs; the runs must already be maximal.
    pub fn from_runs(runs: Vec<Run<P>>) -> Result<Self> {
        let width = runs.iter().map(|r| r.length as usize).sum();
        check_width(width)?;
        let mut line = Self {
            runs,
            ends: Vec::new(),
            width,
        };
        line.rebuild_ends();
        line.validate()?;
        Ok(line)
    }

    /// Number of pixels in the line
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of runs
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn runs(&self) -> &[Run<P>] {
        &self.runs
    }

    /// True if the whole line holds one value
    pub fn is_uniform(&self) -> bool {
        self.runs.len() == 1
    }

    /// First column covered by run `run`.
    ///
    /// # Panics
    /// If `run >= self.run_count()`.
    pub fn run_start(&self, run: usize) -> usize {
        if run == 0 {
            0
        } else {
            self.ends[run - 1]
        }
    }

    /// Exclusive end column of run `run`.
    ///
    /// # Panics
    /// If `run >= self.run_count()`.
    pub fn run_end(&self, run: usize) -> usize {
        self.ends[run]
    }

    /// Run index covering `column` and the offset of `column` inside that run
    pub fn run_index_at(&self, column: usize) -> Result<(usize, usize)> {
        if column >= self.width {
            return Err(VolumeError::OutOfBounds(format!(
                "column {} outside line of width {}",
                column, self.width
            )));
        }
        let run = self.run_containing(column);
        Ok((run, column - self.run_start(run)))
    }

    /// Unchecked lookup for callers that already validated `column`
    pub(crate) fn run_containing(&self, column: usize) -> usize {
        debug_assert!(column < self.width);
        self.ends.partition_point(|&end| end <= column)
    }

    /// Value of run `run`.
    ///
    /// # Panics
    /// If `run >= self.run_count()`.
    pub fn run_value(&self, run: usize) -> P {
        self.runs[run].value
    }

    /// Pixel value at `column`
    pub fn value_at(&self, column: usize) -> Result<P> {
        let (run, _) = self.run_index_at(column)?;
        Ok(self.runs[run].value)
    }

    /// Overwrite columns `start..end` with `value`.
    ///
    /// Boundary runs are split, the covered interior collapses into a single
    /// run and that run is merged with equal neighbours. Returns the index of
    /// the run that covers `start` afterwards.
    pub fn replace_range(&mut self, start: usize, end: usize, value: P) -> Result<usize> {
        if start >= end {
            return Err(VolumeError::InvalidRegion(format!(
                "empty column range {}..{}",
                start, end
            )));
        }
        if end > self.width {
            return Err(VolumeError::OutOfBounds(format!(
                "column range {}..{} outside line of width {}",
                start, end, self.width
            )));
        }

        let (first, _) = self.run_index_at(start)?;
        let (last, _) = self.run_index_at(end - 1)?;

        if first == last && self.runs[first].value == value {
            return Ok(first);
        }

        let first_start = self.run_start(first);
        let last_end = self.run_end(last);

        let mut pieces: Vec<Run<P>> = Vec::with_capacity(3);
        if start > first_start {
            pieces.push(Run::new(
                (start - first_start) as u32,
                self.runs[first].value,
            ));
        }
        pieces.push(Run::new((end - start) as u32, value));
        if end < last_end {
            pieces.push(Run::new((last_end - end) as u32, self.runs[last].value));
        }

        let mut lo = first;
        let mut hi = last + 1;
        if lo > 0 && self.runs[lo - 1].value == pieces[0].value {
            lo -= 1;
            pieces[0].length += self.runs[lo].length;
        }
        if hi < self.runs.len() {
            if let Some(tail) = pieces.last_mut() {
                if self.runs[hi].value == tail.value {
                    tail.length += self.runs[hi].length;
                    hi += 1;
                }
            }
        }

        let mut merged: Vec<Run<P>> = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match merged.last_mut() {
                Some(prev) if prev.value == piece.value => prev.length += piece.length,
                _ => merged.push(piece),
            }
        }

        // Locate the piece covering `start` before the splice shifts indices.
        let mut column = self.run_start(lo);
        let mut covering = lo;
        for (offset, piece) in merged.iter().enumerate() {
            column += piece.length as usize;
            if start < column {
                covering = lo + offset;
                break;
            }
        }

        self.runs.splice(lo..hi, merged);
        self.rebuild_ends();

        debug_assert!(
            self.validate().is_ok(),
            "replace_range({}, {}) corrupted line: {:?}",
            start,
            end,
            self.validate()
        );

        Ok(covering)
    }

    /// Reset the whole line to `value`
    pub fn fill(&mut self, value: P) {
        self.runs.clear();
        self.runs.push(Run::new(self.width as u32, value));
        self.rebuild_ends();
    }

    /// Check the run line invariants
    pub fn validate(&self) -> Result<()> {
        let mut total = 0usize;
        for (i, run) in self.runs.iter().enumerate() {
            if run.length == 0 {
                return Err(VolumeError::InvariantViolation(format!(
                    "run {} has zero length",
                    i
                )));
            }
            if i > 0 && self.runs[i - 1].value == run.value {
                return Err(VolumeError::InvariantViolation(format!(
                    "runs {} and {} share value {:?}",
                    i - 1,
                    i,
                    run.value
                )));
            }
            total += run.length as usize;
        }
        if total != self.width {
            return Err(VolumeError::InvariantViolation(format!(
                "run lengths sum to {} but line width is {}",
                total, self.width
            )));
        }
        Ok(())
    }

    /// Iterate over the decoded pixels
    pub fn iter(&self) -> impl Iterator<Item = P> + '_ {
        self.runs
            .iter()
            .flat_map(|run| std::iter::repeat(run.value).take(run.length as usize))
    }

    /// Decode the whole line
    pub fn decode(&self) -> Vec<P> {
        let mut values = Vec::with_capacity(self.width);
        values.extend(self.iter());
        values
    }

    fn rebuild_ends(&mut self) {
        self.ends.clear();
        let mut end = 0usize;
        for run in &self.runs {
            end += run.length as usize;
            self.ends.push(end);
        }
    }
}
