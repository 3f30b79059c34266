//! Axum router construction for the development engine.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::EngineState;
use crate::ws;

/// Build the engine router.
///
/// - `GET /` -- `WebSocket` batch stream
/// - `GET /status` -- tick and population as JSON
pub fn build_router(state: Arc<EngineState>) -> Router {
    Router::new()
        .route("/", get(ws::ws_stream))
        .route("/status", get(handlers::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
