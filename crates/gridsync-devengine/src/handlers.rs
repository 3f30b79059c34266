//! REST handlers for the development engine.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::state::EngineState;

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Last completed tick.
    pub tick: u64,
    /// Number of active cells.
    pub active_cells: usize,
    /// Lattice half-extent.
    pub range: u16,
    /// Connected viewers.
    pub clients: usize,
}

/// Report the engine's tick and population.
///
/// # Route
///
/// `GET /status`
pub async fn status(State(state): State<Arc<EngineState>>) -> Json<StatusResponse> {
    let (tick, active_cells) = state.status().await;
    Json(StatusResponse {
        tick,
        active_cells,
        range: state.range(),
        clients: state.client_count(),
    })
}
