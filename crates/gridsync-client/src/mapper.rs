//! Engine-space to render-space coordinate mapping.
//!
//! The mapping scales each axis by a fixed spacing in
//! [`MIN_SPACING`, `MAX_SPACING`]. Every `i32` is exactly representable as an
//! `f64`; within those bounds every product stays finite and normal, and
//! adjacent lattice points land more than one ulp apart, so distinct lattice
//! points never collide in render space.

use gridsync_types::Coord;
use serde::{Deserialize, Serialize};

/// Render spacing applied on every axis unless configured.
pub const DEFAULT_SPACING: f64 = 2.0;

/// Smallest accepted spacing: the smallest normal `f64`.
pub const MIN_SPACING: f64 = f64::MIN_POSITIVE;

/// Largest accepted spacing. Scaling `i32::MIN` by it is still finite.
pub const MAX_SPACING: f64 = f64::MAX / 2_147_483_648.0;

/// Errors raised when a spacing factor would break the bijection.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SpacingError {
    /// The factor is zero, negative, NaN, or infinite.
    #[error("spacing on the {axis} axis must be finite and positive, got {value}")]
    NotPositive {
        /// Axis name (`x`, `y`, or `z`).
        axis: char,
        /// The rejected value.
        value: f64,
    },

    /// The factor is positive but would overflow or lose precision.
    #[error(
        "spacing on the {axis} axis must lie in [{min:e}, {max:e}], got {value:e}",
        min = MIN_SPACING,
        max = MAX_SPACING
    )]
    OutOfRange {
        /// Axis name (`x`, `y`, or `z`).
        axis: char,
        /// The rejected value.
        value: f64,
    },
}

impl SpacingError {
    /// The axis that failed validation.
    pub const fn axis(&self) -> char {
        match self {
            Self::NotPositive { axis, .. } | Self::OutOfRange { axis, .. } => *axis,
        }
    }
}

/// Per-axis render spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    /// Scale applied to engine x.
    pub x: f64,
    /// Scale applied to engine y.
    pub y: f64,
    /// Scale applied to engine z.
    pub z: f64,
}

impl Spacing {
    /// The same factor on every axis.
    pub const fn uniform(factor: f64) -> Self {
        Self {
            x: factor,
            y: factor,
            z: factor,
        }
    }

    /// Check that every factor is finite, positive, and within
    /// [`MIN_SPACING`, `MAX_SPACING`].
    ///
    /// # Errors
    ///
    /// Returns [`SpacingError::NotPositive`] or [`SpacingError::OutOfRange`]
    /// naming the first bad axis.
    pub fn validate(&self) -> Result<(), SpacingError> {
        for (axis, value) in [('x', self.x), ('y', self.y), ('z', self.z)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SpacingError::NotPositive { axis, value });
            }
            if !(MIN_SPACING..=MAX_SPACING).contains(&value) {
                return Err(SpacingError::OutOfRange { axis, value });
            }
        }
        Ok(())
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self::uniform(DEFAULT_SPACING)
    }
}

/// A position in render space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderPosition {
    /// Render x.
    pub x: f64,
    /// Render y.
    pub y: f64,
    /// Render z.
    pub z: f64,
}

impl RenderPosition {
    /// The position as an `[x, y, z]` array.
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Dimensions of the reference grid drawn around the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceGrid {
    /// Edge length of the grid in render units.
    pub size: f64,
    /// Number of divisions along each edge.
    pub divisions: u32,
}

/// Pure mapping from engine coordinates to render positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    spacing: Spacing,
}

impl CoordinateMapper {
    /// Create a mapper with the given per-axis spacing.
    ///
    /// # Errors
    ///
    /// Returns [`SpacingError`] if any factor is not finite and positive.
    pub fn new(spacing: Spacing) -> Result<Self, SpacingError> {
        spacing.validate()?;
        Ok(Self { spacing })
    }

    /// The spacing in use.
    pub const fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// Map an engine coordinate into render space.
    pub fn map(&self, coord: Coord) -> RenderPosition {
        RenderPosition {
            x: f64::from(coord.x) * self.spacing.x,
            y: f64::from(coord.y) * self.spacing.y,
            z: f64::from(coord.z) * self.spacing.z,
        }
    }

    /// Reference grid for an engine that spans `[-range, range]` on each axis.
    pub fn reference_grid(&self, range: u16) -> ReferenceGrid {
        let divisions = u32::from(range).saturating_mul(2);
        ReferenceGrid {
            size: f64::from(divisions) * self.spacing.x,
            divisions,
        }
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            spacing: Spacing::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_spacing_doubles_coordinates() {
        let mapper = CoordinateMapper::default();
        let pos = mapper.map(Coord::new(1, -2, 3));
        assert_eq!(pos.to_array(), [2.0, -4.0, 6.0]);
    }

    #[test]
    fn per_axis_spacing_applies_independently() {
        let mapper = CoordinateMapper::new(Spacing {
            x: 1.0,
            y: 0.5,
            z: 3.0,
        });
        assert!(mapper.is_ok());
        let mapper = mapper.unwrap_or_default();
        assert_eq!(mapper.map(Coord::new(4, 4, 4)).to_array(), [4.0, 2.0, 12.0]);
    }

    #[test]
    fn rejects_degenerate_spacing() {
        assert!(CoordinateMapper::new(Spacing::uniform(0.0)).is_err());
        assert!(CoordinateMapper::new(Spacing::uniform(-1.0)).is_err());
        assert!(CoordinateMapper::new(Spacing::uniform(f64::NAN)).is_err());
        assert_eq!(
            Spacing {
                x: 1.0,
                y: f64::INFINITY,
                z: 1.0
            }
            .validate()
            .map_err(|e| e.axis()),
            Err('y')
        );
    }

    #[test]
    fn rejects_spacing_that_would_overflow_or_underflow() {
        assert!(matches!(
            CoordinateMapper::new(Spacing::uniform(1e308)),
            Err(SpacingError::OutOfRange { axis: 'x', .. })
        ));
        assert!(matches!(
            Spacing {
                x: 1.0,
                y: 1.0,
                z: f64::MIN_POSITIVE / 2.0,
            }
            .validate(),
            Err(SpacingError::OutOfRange { axis: 'z', .. })
        ));
        assert!(Spacing::uniform(MAX_SPACING).validate().is_ok());
        assert!(Spacing::uniform(MIN_SPACING).validate().is_ok());
    }

    #[test]
    fn bounds_keep_extreme_coordinates_finite_and_distinct() {
        for factor in [MIN_SPACING, MAX_SPACING] {
            let mapper = CoordinateMapper::new(Spacing::uniform(factor)).unwrap_or_default();
            let lo = mapper.map(Coord::new(i32::MIN, i32::MIN, i32::MIN));
            let hi = mapper.map(Coord::new(i32::MAX, i32::MAX, i32::MAX));
            let below = mapper.map(Coord::new(i32::MAX - 1, 0, 0));
            assert!(lo.to_array().iter().chain(&hi.to_array()).all(|v| v.is_finite()));
            assert_ne!(hi.x, below.x);
            assert_ne!(
                mapper.map(Coord::new(2, 0, 0)),
                mapper.map(Coord::new(3, 0, 0))
            );
        }
    }

    #[test]
    fn extreme_neighbours_stay_distinct() {
        let mapper = CoordinateMapper::new(Spacing::uniform(0.1)).unwrap_or_default();
        let a = mapper.map(Coord::new(i32::MAX, 0, 0));
        let b = mapper.map(Coord::new(i32::MAX - 1, 0, 0));
        assert_ne!(a, b);
    }

    #[test]
    fn reference_grid_matches_engine_range() {
        let grid = CoordinateMapper::default().reference_grid(25);
        assert_eq!(grid.divisions, 50);
        assert_eq!(grid.size, 100.0);
    }
}
