//! Deltas, delta batches, and outbound commands.
//!
//! A [`DeltaBatch`] is applied whole and in order: when a coordinate appears
//! more than once, the last entry wins. A [`Command`] travels the other way
//! and has no acknowledgment.

use serde::{Deserialize, Serialize};

use crate::cell::{CellState, CellStateError, Coord};

/// The new state of one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    /// The cell being updated.
    pub coord: Coord,
    /// Its new state. [`CellState::Empty`] removes the cell.
    pub state: CellState,
}

impl Delta {
    /// Create a delta for a coordinate.
    pub const fn new(coord: Coord, state: CellState) -> Self {
        Self { coord, state }
    }
}

/// An ordered sequence of deltas from one engine message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaBatch {
    /// Engine tick the batch belongs to.
    ///
    /// `None` for frames decoded from the legacy dense grid format, which
    /// carries no tick.
    pub tick: Option<u64>,
    /// The deltas, in arrival order.
    pub deltas: Vec<Delta>,
}

impl DeltaBatch {
    /// Create a batch for an engine tick.
    pub const fn new(tick: u64, deltas: Vec<Delta>) -> Self {
        Self {
            tick: Some(tick),
            deltas,
        }
    }

    /// Create a batch that carries no tick.
    pub const fn untimed(deltas: Vec<Delta>) -> Self {
        Self { tick: None, deltas }
    }

    /// Number of deltas in the batch.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Whether the batch carries no deltas.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

/// An outbound instruction for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Force a cell into a given state.
    InjectState {
        /// The cell to overwrite.
        coord: Coord,
        /// The state to force.
        state: CellState,
    },
}

impl Command {
    /// Build an injection command from raw integers.
    ///
    /// # Errors
    ///
    /// Returns [`CellStateError::OutOfDomain`] if `state` is not `-1`, `0`,
    /// or `1`.
    pub fn inject_state(x: i32, y: i32, z: i32, state: i64) -> Result<Self, CellStateError> {
        Ok(Self::InjectState {
            coord: Coord::new(x, y, z),
            state: CellState::try_from(state)?,
        })
    }

    /// The coordinate the command targets.
    pub const fn coord(&self) -> Coord {
        match self {
            Self::InjectState { coord, .. } => *coord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_state_validates_domain() {
        let command = Command::inject_state(0, 0, 0, 1);
        assert_eq!(
            command,
            Ok(Command::InjectState {
                coord: Coord::new(0, 0, 0),
                state: CellState::Positive,
            })
        );
        assert!(Command::inject_state(0, 0, 0, 3).is_err());
    }

    #[test]
    fn untimed_batch_has_no_tick() {
        let batch = DeltaBatch::untimed(vec![Delta::new(Coord::new(1, 1, 1), CellState::Empty)]);
        assert_eq!(batch.tick, None);
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
    }
}
