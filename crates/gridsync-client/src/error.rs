//! Error types for the synchronization client.
//!
//! Every failure here is local and non-fatal: callers log it and keep the
//! last good render frame on screen. [`SyncError`] unifies the taxonomy;
//! [`DecodeError`] and [`EncodeError`] are the codec's own failures.

use gridsync_types::CellStateError;

use crate::transport::ConnectionState;

/// Errors raised while decoding an inbound engine message.
///
/// A decode error drops exactly one message; the connection stays open.
/// Individual out-of-domain cells are not errors here: the codec skips them
/// and reports them alongside the batch.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The payload is JSON but not the expected batch shape.
    #[error("unexpected payload shape: {0}")]
    Shape(#[source] serde_json::Error),

    /// A dense grid is too large to address with `i32` coordinates.
    #[error("dense grid dimension {0} exceeds the coordinate range")]
    GridTooLarge(usize),
}

/// Errors raised while encoding an outbound command.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("failed to serialize command: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced by the synchronization client.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The connection to the engine was refused or dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound message could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An outbound command could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A command was sent while the connection was not open.
    #[error("command rejected: connection is {state}")]
    CommandRejected {
        /// The connection state at the time of the send.
        state: ConnectionState,
    },

    /// A command was built from a state outside `{-1, 0, 1}`.
    #[error("invalid command: {0}")]
    InvalidState(#[from] CellStateError),
}
