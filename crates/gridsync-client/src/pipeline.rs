//! Inbound pipeline: decode, reconcile, publish.
//!
//! The pipeline is installed as the transport's message handler, so every
//! payload is decoded and applied to completion inside one callback before
//! the next frame is read. Frames are published on a `watch` channel: one
//! writer, any number of readers, each seeing the latest frame.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::codec::{Decoded, MessageCodec};
use crate::error::DecodeError;
use crate::reconcile::{ActiveCellSet, ApplyOutcome, Reconciler, RenderFrame};
use crate::stats::SessionStats;

/// Folds raw payloads into the active-cell set.
#[derive(Debug)]
pub struct InboundPipeline {
    codec: MessageCodec,
    reconciler: Reconciler,
    last_tick: Option<u64>,
    frames: watch::Sender<Arc<RenderFrame>>,
    stats: Arc<SessionStats>,
}

impl InboundPipeline {
    /// Create a pipeline and the receiver its frames are published on.
    pub fn new(
        codec: MessageCodec,
        reconciler: Reconciler,
        stats: Arc<SessionStats>,
    ) -> (Self, watch::Receiver<Arc<RenderFrame>>) {
        let initial = Arc::new(reconciler.cells().frame(None));
        let (frames, rx) = watch::channel(initial);
        (
            Self {
                codec,
                reconciler,
                last_tick: None,
                frames,
                stats,
            },
            rx,
        )
    }

    /// The active-cell set as of the last applied batch.
    pub const fn cells(&self) -> &ActiveCellSet {
        self.reconciler.cells()
    }

    /// Tick of the last applied batch that carried one.
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Process one raw payload.
    ///
    /// A decode failure is logged and counted, and leaves both the
    /// active-cell set and the published frame untouched. Cells with an
    /// invalid state are logged, counted, and skipped; the rest of their
    /// batch is applied.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] for a payload that was dropped.
    pub fn handle(&mut self, raw: &str) -> Result<ApplyOutcome, DecodeError> {
        let Decoded { batch, rejected } = match self.codec.decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.stats.record_decode_failure();
                warn!(error = %e, bytes = raw.len(), "decode error: message dropped");
                return Err(e);
            }
        };
        if !rejected.is_empty() {
            self.stats.record_rejected_cells(rejected.len());
            for cell in &rejected {
                warn!(tick = ?batch.tick, error = %cell, "invalid cell skipped");
            }
        }

        if let (Some(tick), Some(last)) = (batch.tick, self.last_tick)
            && tick <= last
        {
            warn!(tick, last_tick = last, "tick did not advance, applying in arrival order");
        }
        if batch.tick.is_some() {
            self.last_tick = batch.tick;
        }

        let outcome = self.reconciler.apply(&batch);
        self.stats.record_batch();

        let frame = Arc::new(self.reconciler.cells().frame(batch.tick));
        debug!(tick = ?batch.tick, active = frame.len(), "publishing frame");
        self.frames.send_replace(frame);
        Ok(outcome)
    }
}
