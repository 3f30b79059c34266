//! Lattice coordinates and cell states.
//!
//! A cell has no identity beyond its [`Coord`]. Its [`CellState`] is one of
//! three values: empty, or one of two active [`Category`] variants that the
//! viewer only distinguishes by color.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised when an integer does not name a valid [`CellState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CellStateError {
    /// The value is outside `{-1, 0, 1}`.
    #[error("cell state {0} is outside {{-1, 0, 1}}")]
    OutOfDomain(i64),
}

/// Integer coordinate of a cell in engine space.
///
/// The coordinate is the primary key of every cell the client tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Position along the engine's x axis.
    pub x: i32,
    /// Position along the engine's y axis.
    pub y: i32,
    /// Position along the engine's z axis.
    pub z: i32,
}

impl Coord {
    /// Create a coordinate from its three components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The string key handed to the render adapter, formatted `x,y,z`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Coord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self { x, y, z }
    }
}

/// One of the two active cell categories.
///
/// Opaque to the client: the engine owns whatever the categories mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Cells whose state is `1`.
    Positive,
    /// Cells whose state is `-1`.
    Negative,
}

impl Category {
    /// Default render color as linear RGB components in `[0, 1]`.
    pub const fn color(self) -> [f32; 3] {
        match self {
            Self::Positive => [1.0, 0.2, 0.2],
            Self::Negative => [0.2, 0.2, 1.0],
        }
    }

    /// The cell state that produces this category.
    pub const fn state(self) -> CellState {
        match self {
            Self::Positive => CellState::Positive,
            Self::Negative => CellState::Negative,
        }
    }
}

/// The state of a single cell as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i8")]
pub enum CellState {
    /// Wire value `-1`.
    Negative,
    /// Wire value `0`: inactive.
    Empty,
    /// Wire value `1`.
    Positive,
}

impl CellState {
    /// The active category for this state, or `None` when the cell is empty.
    pub const fn category(self) -> Option<Category> {
        match self {
            Self::Positive => Some(Category::Positive),
            Self::Negative => Some(Category::Negative),
            Self::Empty => None,
        }
    }

    /// Whether this state removes the cell from the active set.
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The integer carried on the wire.
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Empty => 0,
            Self::Positive => 1,
        }
    }
}

impl From<CellState> for i8 {
    fn from(state: CellState) -> Self {
        state.as_i8()
    }
}

impl TryFrom<i64> for CellState {
    type Error = CellStateError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Negative),
            0 => Ok(Self::Empty),
            1 => Ok(Self::Positive),
            other => Err(CellStateError::OutOfDomain(other)),
        }
    }
}

impl TryFrom<i8> for CellState {
    type Error = CellStateError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_domain_is_closed() {
        assert_eq!(CellState::try_from(-1_i64), Ok(CellState::Negative));
        assert_eq!(CellState::try_from(0_i64), Ok(CellState::Empty));
        assert_eq!(CellState::try_from(1_i64), Ok(CellState::Positive));
        assert_eq!(
            CellState::try_from(2_i64),
            Err(CellStateError::OutOfDomain(2))
        );
        assert_eq!(
            CellState::try_from(-7_i8),
            Err(CellStateError::OutOfDomain(-7))
        );
    }

    #[test]
    fn empty_state_has_no_category() {
        assert_eq!(CellState::Empty.category(), None);
        assert_eq!(CellState::Positive.category(), Some(Category::Positive));
        assert_eq!(CellState::Negative.category(), Some(Category::Negative));
    }

    #[test]
    fn category_round_trips_through_state() {
        for category in [Category::Positive, Category::Negative] {
            assert_eq!(category.state().category(), Some(category));
        }
    }

    #[test]
    fn categories_have_distinct_colors() {
        assert_ne!(Category::Positive.color(), Category::Negative.color());
    }

    #[test]
    fn coord_key_matches_render_format() {
        assert_eq!(Coord::new(2, -3, 0).key(), "2,-3,0");
    }

    #[test]
    fn state_serializes_as_integer() {
        let json = serde_json::to_string(&CellState::Negative).unwrap_or_default();
        assert_eq!(json, "-1");
        let parsed: Result<CellState, _> = serde_json::from_str("4");
        assert!(parsed.is_err());
    }
}
