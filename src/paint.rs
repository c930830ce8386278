//! Label painting with a brush
//!
//! A brush stroke stamps a round or square footprint around a center voxel
//! into a label volume. Which voxels actually change is decided by the
//! coverage mode, mirroring the usual segmentation editor rules:
//!
//! - [`CoverageMode::PaintOverAll`] replaces every voxel under the brush
//! - [`CoverageMode::PaintOverOne`] replaces only voxels holding the
//!   overwrite label
//! - [`CoverageMode::PaintOverColors`] replaces only non-background voxels
//!
//! Strokes walk the footprint with a [`WriteIterator`](crate::WriteIterator),
//! so they never decode the volume.

use crate::error::{Result, VolumeError};
use crate::store::RleStore;
use crate::types::{Axis, Index3, Pixel, Region};
use log::debug;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Shape of the brush footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushShape {
    Round,
    Square,
}

/// Which voxels a paint stroke may overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageMode {
    PaintOverAll,
    PaintOverOne,
    PaintOverColors,
}

/// Brush geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    /// Radius in voxels; integral radii give even diameters
    pub radius: f64,

    pub shape: BrushShape,

    /// Axis the brush is flattened along, `None` for a volumetric brush
    pub flat_axis: Option<Axis>,

    /// Axis normal to the painted slice; never shifted by the half-voxel
    /// offset, so the brush stays odd-sized along it
    pub slice_axis: Axis,

    /// Voxel spacing; when set, the footprint is isotropic in world units
    pub spacing: Option<[f64; 3]>,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            radius: 4.0,
            shape: BrushShape::Round,
            flat_axis: Some(Axis::Z),
            slice_axis: Axis::Z,
            spacing: None,
        }
    }
}

impl Brush {
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_shape(mut self, shape: BrushShape) -> Self {
        self.shape = shape;
        self
    }

    /// Flatten the brush to a single slice along `axis`
    pub fn flat(mut self, axis: Axis) -> Self {
        self.flat_axis = Some(axis);
        self.slice_axis = axis;
        self
    }

    /// Extend the brush along all three axes, keeping the current slice axis
    pub fn volumetric(mut self) -> Self {
        self.flat_axis = None;
        self
    }

    pub fn with_slice_axis(mut self, axis: Axis) -> Self {
        self.slice_axis = axis;
        self
    }

    pub fn with_spacing(mut self, spacing: [f64; 3]) -> Self {
        self.spacing = Some(spacing);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < 0.5 {
            return Err(VolumeError::InvalidRegion(format!(
                "brush radius must be at least 0.5, got {}",
                self.radius
            )));
        }
        if let Some(spacing) = self.spacing {
            if spacing.iter().any(|&s| !s.is_finite() || s <= 0.0) {
                return Err(VolumeError::InvalidDimensions(format!(
                    "brush spacing must be positive, got {:?}",
                    spacing
                )));
            }
        }
        Ok(())
    }

    fn is_flat(&self, axis: usize) -> bool {
        self.flat_axis.map(|a| a.to_index()) == Some(axis)
    }

    /// Bounding box of the brush around `center`, cropped to `within`
    pub fn footprint(&self, center: Index3, within: &Region) -> Option<Region> {
        let mut index = [0i64; 3];
        let mut size = [1usize; 3];
        for axis in 0..3 {
            if self.is_flat(axis) {
                index[axis] = center[axis] as i64;
            } else {
                index[axis] = (center[axis] as f64 - self.radius) as i64;
                size[axis] = (2.0 * self.radius + 1.0) as usize;
            }
        }
        Region::from_signed(index, size, within)
    }

    /// Check if `voxel` is covered by the brush centered on `center`
    pub fn covers(&self, center: Index3, voxel: Index3) -> bool {
        let integral = self.radius.fract() == 0.0;
        let min_spacing = self
            .spacing
            .map(|s| s.iter().copied().fold(f64::INFINITY, f64::min));

        let mut delta = [0.0f64; 3];
        for axis in 0..3 {
            let on_slice = self.is_flat(axis) || self.slice_axis.to_index() == axis;
            let shift = if integral && !on_slice {
                0.5
            } else {
                0.0
            };
            let mut d = voxel[axis] as f64 + shift - center[axis] as f64;
            if let (Some(spacing), Some(min)) = (self.spacing, min_spacing) {
                d *= spacing[axis] / min;
            }
            delta[axis] = d;
        }

        let limit = self.radius - 0.25;
        match self.shape {
            BrushShape::Round => delta.iter().map(|d| d * d).sum::<f64>() <= limit * limit,
            BrushShape::Square => delta.iter().fold(0.0f64, |m, d| m.max(d.abs())) <= limit,
        }
    }
}

/// Labels and coverage rule of a stroke
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaintSettings<P> {
    pub drawing_label: P,
    pub overwrite_label: P,
    pub coverage: CoverageMode,
}

impl<P: Pixel + Zero> PaintSettings<P> {
    /// Paint `drawing_label` over everything
    pub fn new(drawing_label: P) -> Self {
        Self {
            drawing_label,
            overwrite_label: P::zero(),
            coverage: CoverageMode::PaintOverAll,
        }
    }

    pub fn with_overwrite_label(mut self, label: P) -> Self {
        self.overwrite_label = label;
        self
    }

    pub fn with_coverage(mut self, coverage: CoverageMode) -> Self {
        self.coverage = coverage;
        self
    }

    /// New value of a voxel under a paint stroke, `None` to leave it alone
    fn paint_value(&self, current: P) -> Option<P> {
        let allowed = match self.coverage {
            CoverageMode::PaintOverAll => true,
            CoverageMode::PaintOverOne => current == self.overwrite_label,
            CoverageMode::PaintOverColors => !current.is_zero(),
        };
        allowed.then_some(self.drawing_label)
    }

    /// New value of a voxel under an erase stroke, `None` to leave it alone
    fn erase_value(&self, current: P) -> Option<P> {
        if !self.drawing_label.is_zero() {
            (current == self.drawing_label).then(P::zero)
        } else if self.coverage == CoverageMode::PaintOverOne {
            Some(self.overwrite_label)
        } else {
            None
        }
    }
}

/// A brush bound to paint settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paintbrush<P> {
    brush: Brush,
    settings: PaintSettings<P>,
}

impl<P: Pixel + Zero> Paintbrush<P> {
    pub fn new(brush: Brush, settings: PaintSettings<P>) -> Result<Self> {
        brush.validate()?;
        Ok(Self { brush, settings })
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn settings(&self) -> &PaintSettings<P> {
        &self.settings
    }

    /// Paint the drawing label around `center`. Returns true if any voxel changed.
    pub fn paint(&self, store: &mut RleStore<P>, center: Index3) -> Result<bool> {
        let changed = self.stroke(store, center, |v| self.settings.paint_value(v))?;
        debug!("paint stroke at {:?}: changed={}", center, changed);
        Ok(changed)
    }

    /// Clear the drawing label around `center`. Returns true if any voxel changed.
    pub fn erase(&self, store: &mut RleStore<P>, center: Index3) -> Result<bool> {
        let changed = self.stroke(store, center, |v| self.settings.erase_value(v))?;
        debug!("erase stroke at {:?}: changed={}", center, changed);
        Ok(changed)
    }

    fn stroke<F>(&self, store: &mut RleStore<P>, center: Index3, rule: F) -> Result<bool>
    where
        F: Fn(P) -> Option<P>,
    {
        let footprint = match self.brush.footprint(center, &store.buffered_region()) {
            Some(region) => region,
            None => return Ok(false),
        };

        let mut changed = false;
        let mut it = store.begin_write(&footprint)?;
        while let (Some(voxel), Some(current)) = (it.coordinate(), it.value()) {
            if self.brush.covers(center, voxel) {
                if let Some(value) = rule(current) {
                    it.set_value(value)?;
                    changed |= value != current;
                }
            }
            it.advance();
        }
        Ok(changed)
    }
}
