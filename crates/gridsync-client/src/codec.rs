//! Message codec: raw engine payloads in, typed delta batches out.
//!
//! Two inbound formats are understood:
//!
//! - [`WireFormat::Delta`] -- `{"tick": N, "cells": [{x, y, z, state}, ...]}`
//! - [`WireFormat::DenseGrid`] -- a bare `number[][]` holding every cell of a
//!   2-D plane, as streamed by the first engine prototype
//!
//! Decoding never panics. A payload that is not JSON or not the expected
//! shape is a [`DecodeError`], and the caller drops that one message. A
//! single cell with a state outside `{-1, 0, 1}` is skipped on its own and
//! reported in [`Decoded::rejected`]; its siblings are still applied, since
//! the engine never resends them.

use gridsync_types::{
    CellState, CellStateError, Command, Coord, Delta, DeltaBatch, WireBatch, WireCommand,
};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};

/// Shape of the inbound engine stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Tick-stamped delta batches.
    #[default]
    Delta,
    /// Full 2-D grids on the `z = 0` plane, centered on the origin.
    DenseGrid,
}

/// A cell record skipped from an otherwise valid message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell at {coord}: {source}")]
pub struct RejectedCell {
    /// Where the engine said the cell was.
    pub coord: Coord,
    /// Why its state was refused.
    pub source: CellStateError,
}

/// Result of decoding one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// The valid deltas, in arrival order.
    pub batch: DeltaBatch,
    /// Cells left out of `batch` because their state was out of domain.
    pub rejected: Vec<RejectedCell>,
}

/// Stateless codec for one wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec {
    format: WireFormat,
}

impl MessageCodec {
    /// Create a codec for the given inbound format.
    pub const fn new(format: WireFormat) -> Self {
        Self { format }
    }

    /// The inbound format this codec expects.
    pub const fn format(&self) -> WireFormat {
        self.format
    }

    /// Decode one raw payload into a [`DeltaBatch`] plus any cells that
    /// had to be skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if the payload is not JSON, and
    /// [`DecodeError::Shape`] if it is JSON of the wrong shape.
    pub fn decode(&self, raw: &str) -> Result<Decoded, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(DecodeError::Malformed)?;
        match self.format {
            WireFormat::Delta => decode_delta(value),
            WireFormat::DenseGrid => decode_dense(value),
        }
    }

    /// Encode a command into its JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Serialize`] if serialization fails, which
    /// does not happen for commands built through [`Command::inject_state`].
    pub fn encode(&self, command: &Command) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(&WireCommand::from(*command))?)
    }
}

fn decode_delta(value: serde_json::Value) -> Result<Decoded, DecodeError> {
    let wire: WireBatch = serde_json::from_value(value).map_err(DecodeError::Shape)?;
    let mut deltas = Vec::with_capacity(wire.cells.len());
    let mut rejected = Vec::new();
    for cell in wire.cells {
        match Delta::try_from(cell) {
            Ok(delta) => deltas.push(delta),
            Err(source) => rejected.push(RejectedCell {
                coord: Coord::new(cell.x, cell.y, cell.z),
                source,
            }),
        }
    }
    Ok(Decoded {
        batch: DeltaBatch::new(wire.tick, deltas),
        rejected,
    })
}

fn decode_dense(value: serde_json::Value) -> Result<Decoded, DecodeError> {
    let rows: Vec<Vec<i64>> = serde_json::from_value(value).map_err(DecodeError::Shape)?;
    let offset = axis_index(rows.len() / 2)?;

    let mut deltas = Vec::with_capacity(rows.iter().map(Vec::len).sum());
    let mut rejected = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        let y = axis_index(row_index)?.saturating_sub(offset);
        for (col_index, &raw_state) in row.iter().enumerate() {
            let coord = Coord::new(axis_index(col_index)?.saturating_sub(offset), y, 0);
            match CellState::try_from(raw_state) {
                Ok(state) => deltas.push(Delta::new(coord, state)),
                Err(source) => rejected.push(RejectedCell { coord, source }),
            }
        }
    }
    Ok(Decoded {
        batch: DeltaBatch::untimed(deltas),
        rejected,
    })
}

fn axis_index(index: usize) -> Result<i32, DecodeError> {
    i32::try_from(index).or(Err(DecodeError::GridTooLarge(index)))
}
