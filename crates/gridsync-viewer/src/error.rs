//! Error types for the viewer binary.

use gridsync_client::{ConfigError, SyncError};
use gridsync_types::CellStateError;

/// Errors that can occur while running the viewer.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An input line did not have the shape `x y z state`.
    #[error("expected `x y z state`, got {0:?}")]
    BadLine(String),

    /// An input field was not an integer.
    #[error("field {field} is not an integer: {value:?}")]
    BadField {
        /// Which field failed (`x`, `y`, `z`, or `state`).
        field: &'static str,
        /// The offending text.
        value: String,
    },

    /// The requested state is outside `{-1, 0, 1}`.
    #[error(transparent)]
    InvalidState(#[from] CellStateError),

    /// The command could not be sent.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Reading stdin or installing the signal handler failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
