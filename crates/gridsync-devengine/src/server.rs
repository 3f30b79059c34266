//! Engine lifecycle: bind, serve, and tick on background tasks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::DevEngineError;
use crate::router::build_router;
use crate::state::EngineState;

/// A running engine: HTTP server plus tick loop.
#[derive(Debug)]
pub struct RunningEngine {
    /// The address the server is bound to.
    pub addr: SocketAddr,
    /// Shared engine state.
    pub state: Arc<EngineState>,
    server: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

impl RunningEngine {
    /// The `WebSocket` URL viewers connect to.
    pub fn url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Stop serving and ticking.
    pub fn shutdown(self) {
        self.ticker.abort();
        self.server.abort();
        info!(addr = %self.addr, "development engine stopped");
    }
}

/// Bind the listener and spawn the server and tick loop.
///
/// # Errors
///
/// Returns [`DevEngineError::Config`] for an unusable configuration and
/// [`DevEngineError::Bind`] if the address cannot be bound.
pub async fn start(config: &EngineConfig) -> Result<RunningEngine, DevEngineError> {
    config.validate()?;
    let requested = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&requested)
        .await
        .map_err(|e| DevEngineError::Bind(format!("bind failed on {requested}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| DevEngineError::Bind(format!("no local address: {e}")))?;

    let state = Arc::new(EngineState::new(config));
    let router = build_router(Arc::clone(&state));

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            warn!(error = %DevEngineError::Serve(e.to_string()), "engine server stopped");
        }
    });
    let ticker = tokio::spawn(run_ticks(Arc::clone(&state), config.tick_interval));

    info!(%addr, tick_ms = config.tick_interval.as_millis(), "development engine listening");
    Ok(RunningEngine {
        addr,
        state,
        server,
        ticker,
    })
}

async fn run_ticks(state: Arc<EngineState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let delivered = state.tick().await;
        debug!(delivered, "tick broadcast");
    }
}
