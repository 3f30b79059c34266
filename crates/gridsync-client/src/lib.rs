//! Sparse grid state synchronization client.
//!
//! A remote simulation engine streams cell-state deltas for a 3-D lattice
//! over a `WebSocket`. This crate keeps a minimal, consistent view of the
//! currently active cells and lets the viewer push state back.
//!
//! # Architecture
//!
//! ```text
//! Transport --> MessageCodec --> Reconciler --> RenderFrame (watch) --> render adapter
//! CommandEmitter --> MessageCodec --> CommandSender --> Transport
//! ```
//!
//! - [`transport`] -- the connection and its lifecycle state machine
//! - [`codec`] -- payload decoding and command encoding
//! - [`reconcile`] -- the active-cell set and the batch fold
//! - [`mapper`] -- engine-space to render-space mapping
//! - [`command`] -- fire-and-forget command emitter
//! - [`pipeline`] -- the inbound handler tying codec and reconciler together
//! - [`session`] -- one mounted viewer
//!
//! Failures never escape as panics: transport, decode, and command errors
//! are logged, counted, and leave the last good frame on display.

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod reconcile;
pub mod session;
pub mod stats;
pub mod transport;

// Re-export primary types for convenience.
pub use codec::{Decoded, MessageCodec, RejectedCell, WireFormat};
pub use command::CommandEmitter;
pub use config::{ClientConfig, ConfigError};
pub use error::{DecodeError, EncodeError, SyncError};
pub use mapper::{
    CoordinateMapper, MAX_SPACING, MIN_SPACING, ReferenceGrid, RenderPosition, Spacing,
    SpacingError,
};
pub use pipeline::InboundPipeline;
pub use reconcile::{ActiveCell, ActiveCellSet, ApplyOutcome, Reconciler, RenderCell, RenderFrame};
pub use session::ViewerSession;
pub use stats::{SessionStats, StatsSnapshot};
pub use transport::{CommandSender, ConnectionState, Transport};
