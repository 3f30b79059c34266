//! Error types for the development engine.

use gridsync_types::Coord;

/// Errors that can occur while configuring or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum DevEngineError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The TCP listener could not bind.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal I/O error.
    #[error("serve error: {0}")]
    Serve(String),

    /// An injection targeted a cell outside the lattice.
    #[error("coordinate {coord} is outside [-{range}, {range}] on some axis")]
    OutOfBounds {
        /// The requested coordinate.
        coord: Coord,
        /// The lattice half-extent.
        range: i32,
    },
}
