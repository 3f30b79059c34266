//! Shared application state for the development engine.
//!
//! [`EngineState`] holds the world behind a lock and the broadcast channel
//! every connected client subscribes to. The tick loop broadcasts while
//! still holding the write lock, and a new client takes its snapshot and
//! its subscription under the read lock, so no client misses or repeats a
//! tick.

use gridsync_types::{Command, WireBatch};
use tokio::sync::{RwLock, broadcast};

use crate::config::EngineConfig;
use crate::error::DevEngineError;
use crate::world::World;

/// Capacity of the batch broadcast channel.
///
/// A client that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// State shared between the tick loop and the `WebSocket` handlers.
#[derive(Debug)]
pub struct EngineState {
    world: RwLock<World>,
    tx: broadcast::Sender<WireBatch>,
    range: u16,
}

impl EngineState {
    /// Create the state for a fresh world.
    pub fn new(config: &EngineConfig) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            world: RwLock::new(World::new(config)),
            tx,
            range: config.range,
        }
    }

    /// Lattice half-extent.
    pub const fn range(&self) -> u16 {
        self.range
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Take a snapshot and subscribe to subsequent batches atomically.
    pub async fn join(&self) -> (WireBatch, broadcast::Receiver<WireBatch>) {
        let world = self.world.read().await;
        (world.snapshot(), self.tx.subscribe())
    }

    /// Queue a command for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`DevEngineError::OutOfBounds`] for a cell outside the lattice.
    pub async fn inject(&self, command: Command) -> Result<(), DevEngineError> {
        self.world.write().await.inject(command)
    }

    /// Run one tick and broadcast its batch.
    ///
    /// Returns the number of clients that received it.
    pub async fn tick(&self) -> usize {
        let mut world = self.world.write().await;
        let batch = world.advance();
        // send fails only when there are zero receivers, which is normal.
        self.tx.send(batch).unwrap_or(0)
    }

    /// Current tick and active cell count.
    pub async fn status(&self) -> (u64, usize) {
        let world = self.world.read().await;
        (world.tick(), world.active_cells())
    }
}
