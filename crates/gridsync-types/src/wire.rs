//! JSON wire shapes exchanged with the simulation engine.
//!
//! Inbound, the engine sends one [`WireBatch`] per message. Outbound, the
//! client sends a [`WireCommand`] envelope tagged `INJECT_STATE`. These
//! structs carry raw integers; validation into domain types happens in the
//! client's codec.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cell::{CellState, CellStateError, Coord};
use crate::delta::{Command, Delta};

/// One cell record as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WireCell {
    /// Engine x coordinate.
    pub x: i32,
    /// Engine y coordinate.
    pub y: i32,
    /// Engine z coordinate.
    pub z: i32,
    /// Raw state; valid values are `-1`, `0`, and `1`.
    #[ts(type = "number")]
    pub state: i64,
}

impl TryFrom<WireCell> for Delta {
    type Error = CellStateError;

    fn try_from(cell: WireCell) -> Result<Self, Self::Error> {
        Ok(Self {
            coord: Coord::new(cell.x, cell.y, cell.z),
            state: CellState::try_from(cell.state)?,
        })
    }
}

impl From<Delta> for WireCell {
    fn from(delta: Delta) -> Self {
        Self {
            x: delta.coord.x,
            y: delta.coord.y,
            z: delta.coord.z,
            state: i64::from(delta.state.as_i8()),
        }
    }
}

/// One inbound message: a tick and the cells that changed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WireBatch {
    /// Engine tick number.
    #[ts(type = "number")]
    pub tick: u64,
    /// Changed cells, in order.
    pub cells: Vec<WireCell>,
}

/// Outbound command envelope.
///
/// Serializes as `{"type": "INJECT_STATE", "payload": {x, y, z, state}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload")]
#[ts(export, export_to = "bindings/")]
pub enum WireCommand {
    /// Force a cell into a state.
    #[serde(rename = "INJECT_STATE")]
    InjectState(WireCell),
}

impl From<Command> for WireCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::InjectState { coord, state } => {
                Self::InjectState(WireCell::from(Delta::new(coord, state)))
            }
        }
    }
}

impl TryFrom<WireCommand> for Command {
    type Error = CellStateError;

    fn try_from(command: WireCommand) -> Result<Self, Self::Error> {
        match command {
            WireCommand::InjectState(cell) => {
                let delta = Delta::try_from(cell)?;
                Ok(Self::InjectState {
                    coord: delta.coord,
                    state: delta.state,
                })
            }
        }
    }
}
