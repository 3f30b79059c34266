//! Session counters.
//!
//! Written from the connection task and the command emitter, read from
//! anywhere. Relaxed atomics are enough: the counters are independent.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters for one viewer session.
#[derive(Debug, Default)]
pub struct SessionStats {
    batches_applied: AtomicU64,
    decode_failures: AtomicU64,
    cells_rejected: AtomicU64,
    commands_sent: AtomicU64,
    commands_rejected: AtomicU64,
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Batches decoded and reconciled.
    pub batches_applied: u64,
    /// Inbound messages dropped because they failed to decode.
    pub decode_failures: u64,
    /// Cells skipped from applied batches because their state was invalid.
    pub cells_rejected: u64,
    /// Commands handed to the transport.
    pub commands_sent: u64,
    /// Commands discarded because the connection was not open.
    pub commands_rejected: u64,
}

impl SessionStats {
    pub(crate) fn record_batch(&self) {
        self.batches_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_cells(&self, count: usize) {
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        self.cells_rejected.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.commands_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_applied: self.batches_applied.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            cells_rejected: self.cells_rejected.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
        }
    }
}
