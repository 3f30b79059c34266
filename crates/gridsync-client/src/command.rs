//! Command emitter: the outbound half of the session.
//!
//! Commands are fire-and-forget. When the connection is not open the
//! command is counted as rejected and dropped; it is never queued or
//! retried.

use std::sync::Arc;

use gridsync_types::{CellState, Command, Coord};
use tracing::debug;

use crate::codec::MessageCodec;
use crate::error::SyncError;
use crate::stats::SessionStats;
use crate::transport::CommandSender;

/// Builds, encodes, and sends commands through a [`CommandSender`].
#[derive(Debug, Clone)]
pub struct CommandEmitter {
    sender: CommandSender,
    codec: MessageCodec,
    stats: Arc<SessionStats>,
}

impl CommandEmitter {
    /// Create an emitter over a sending capability.
    pub const fn new(sender: CommandSender, codec: MessageCodec, stats: Arc<SessionStats>) -> Self {
        Self {
            sender,
            codec,
            stats,
        }
    }

    /// Force `coord` into `state` on the engine.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CommandRejected`] if the connection is not open.
    pub fn inject_state(&self, coord: Coord, state: CellState) -> Result<(), SyncError> {
        self.inject(Command::InjectState { coord, state })
    }

    /// Encode and send an already-built command.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Encode`] if the command cannot be serialized, or
    /// [`SyncError::CommandRejected`] if the connection is not open.
    pub fn inject(&self, command: Command) -> Result<(), SyncError> {
        let payload = match self.codec.encode(&command) {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.record_rejected();
                return Err(e.into());
            }
        };
        match self.sender.send(payload) {
            Ok(()) => {
                self.stats.record_sent();
                debug!(coord = %command.coord(), "command sent");
                Ok(())
            }
            Err(e) => {
                self.stats.record_rejected();
                debug!(coord = %command.coord(), "command discarded");
                Err(e)
            }
        }
    }
}
