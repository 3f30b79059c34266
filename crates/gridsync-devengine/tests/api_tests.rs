//! Integration tests for the development engine's HTTP routes.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use gridsync_devengine::handlers::StatusResponse;
use gridsync_devengine::{DevEngineError, EngineConfig, EngineState, build_router};
use gridsync_types::{CellState, Command, Coord};
use tower::ServiceExt;

fn quiet_state() -> Arc<EngineState> {
    Arc::new(EngineState::new(&EngineConfig {
        flips_per_tick: 0,
        range: 10,
        ..EngineConfig::default()
    }))
}

async fn get_status(state: Arc<EngineState>) -> StatusResponse {
    let response = build_router(state)
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn status_reports_fresh_world() {
    let status = get_status(quiet_state()).await;
    assert_eq!(
        status,
        StatusResponse {
            tick: 0,
            active_cells: 0,
            range: 10,
            clients: 0,
        }
    );
}

#[tokio::test]
async fn status_reflects_injected_cells_after_tick() {
    let state = quiet_state();
    state
        .inject(Command::InjectState {
            coord: Coord::new(1, 1, 1),
            state: CellState::Positive,
        })
        .await
        .unwrap();
    state.tick().await;

    let status = get_status(Arc::clone(&state)).await;
    assert_eq!(status.tick, 1);
    assert_eq!(status.active_cells, 1);
}

#[tokio::test]
async fn out_of_bounds_injection_never_lands() {
    let state = quiet_state();
    let result = state
        .inject(Command::InjectState {
            coord: Coord::new(11, 0, 0),
            state: CellState::Positive,
        })
        .await;
    assert!(matches!(
        result,
        Err(DevEngineError::OutOfBounds { range: 10, .. })
    ));
    state.tick().await;

    let status = get_status(Arc::clone(&state)).await;
    assert_eq!(status.tick, 1);
    assert_eq!(status.active_cells, 0);
}

#[tokio::test]
async fn tick_reaches_joined_subscribers() {
    let state = quiet_state();
    let (snapshot, mut rx) = state.join().await;
    assert_eq!(snapshot.tick, 0);

    assert_eq!(state.tick().await, 1);
    let batch = rx.recv().await.unwrap();
    assert_eq!(batch.tick, 1);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = build_router(quiet_state())
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
