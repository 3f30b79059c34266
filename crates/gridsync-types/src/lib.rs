//! Shared type definitions for the grid synchronization client.
//!
//! This crate is the single source of truth for the values that cross the
//! boundary between the simulation engine and the viewer. Wire types flow
//! downstream to `TypeScript` via `ts-rs` for the front-end render adapter.
//!
//! # Modules
//!
//! - [`cell`] -- Lattice coordinates, cell states, and active categories
//! - [`delta`] -- Deltas, delta batches, and outbound commands
//! - [`wire`] -- JSON wire shapes exchanged with the engine

pub mod cell;
pub mod delta;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use cell::{Category, CellState, CellStateError, Coord};
pub use delta::{Command, Delta, DeltaBatch};
pub use wire::{WireBatch, WireCell, WireCommand};
