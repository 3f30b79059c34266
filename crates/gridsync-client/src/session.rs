//! Viewer session: one mount of the viewing surface.
//!
//! [`ViewerSession::mount`] wires codec, reconciler, and transport together
//! without touching the network. [`ViewerSession::connect`] opens the
//! connection once; [`ViewerSession::unmount`] tears it down exactly once
//! by consuming the session.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::codec::MessageCodec;
use crate::command::CommandEmitter;
use crate::config::{ClientConfig, ConfigError};
use crate::mapper::{CoordinateMapper, ReferenceGrid};
use crate::pipeline::InboundPipeline;
use crate::reconcile::{Reconciler, RenderFrame};
use crate::stats::{SessionStats, StatsSnapshot};
use crate::transport::{ConnectionState, Transport};

/// The synchronization client for one mounted viewer.
#[derive(Debug)]
pub struct ViewerSession {
    transport: Transport,
    codec: MessageCodec,
    frames: watch::Receiver<Arc<RenderFrame>>,
    stats: Arc<SessionStats>,
    reference_grid: ReferenceGrid,
}

impl ViewerSession {
    /// Build every component for `config`. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails
    /// validation.
    pub fn mount(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mapper = CoordinateMapper::new(config.render.spacing)
            .map_err(|e| ConfigError::Invalid(format!("render.spacing: {e}")))?;
        let codec = MessageCodec::new(config.transport.wire_format);
        let stats = Arc::new(SessionStats::default());

        let (mut pipeline, frames) =
            InboundPipeline::new(codec, Reconciler::new(mapper), Arc::clone(&stats));
        let transport = Transport::new(config.transport.endpoint.clone());
        transport.on_message(move |raw| {
            // Failures are logged and counted inside the pipeline.
            let _ = pipeline.handle(raw);
        });

        info!(
            endpoint = %transport.endpoint(),
            wire_format = ?codec.format(),
            "viewer session mounted"
        );

        Ok(Self {
            transport,
            codec,
            frames,
            stats,
            reference_grid: mapper.reference_grid(config.render.grid_range),
        })
    }

    /// Open the engine connection. Returns the resulting state.
    pub async fn connect(&mut self) -> ConnectionState {
        self.transport.open().await
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Subscribe to connection state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.transport.state_changes()
    }

    /// Subscribe to render frames. The receiver always holds the latest.
    pub fn frames(&self) -> watch::Receiver<Arc<RenderFrame>> {
        self.frames.clone()
    }

    /// The most recently published frame.
    pub fn latest_frame(&self) -> Arc<RenderFrame> {
        Arc::clone(&self.frames.borrow())
    }

    /// A command emitter bound to this session's connection.
    pub fn emitter(&self) -> CommandEmitter {
        CommandEmitter::new(
            self.transport.command_sender(),
            self.codec,
            Arc::clone(&self.stats),
        )
    }

    /// Current counter values.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Reference grid dimensions for the render adapter.
    pub const fn reference_grid(&self) -> ReferenceGrid {
        self.reference_grid
    }

    /// Close the connection and release the session.
    pub async fn unmount(mut self) {
        self.transport.close().await;
        info!(stats = ?self.stats.snapshot(), "viewer session unmounted");
    }
}
