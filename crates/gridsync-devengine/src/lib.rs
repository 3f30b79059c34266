//! Development stand-in for the simulation engine.
//!
//! Streams tick-stamped delta batches over a `WebSocket` in the same wire
//! format as the real engine, and applies `INJECT_STATE` commands sent by
//! viewers. The cells it writes are random; it implements no automaton
//! rules. Used for local runs of the viewer and for integration tests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod world;
pub mod ws;

// Re-export primary types for convenience.
pub use config::EngineConfig;
pub use error::DevEngineError;
pub use router::build_router;
pub use server::{RunningEngine, start};
pub use state::EngineState;
