//! Headless viewer entry point.
//!
//! Mounts a viewer session against the simulation engine and logs every
//! reconciled frame in place of drawing it. Lines typed on stdin in the
//! form `x y z state` are sent to the engine as `INJECT_STATE` commands.
//!
//! # Architecture
//!
//! ```text
//! engine --> Transport --> Codec --> Reconciler --> frames --> render::draw
//! stdin  --> input::parse_line --> CommandEmitter --> Transport --> engine
//! ```
//!
//! Connection failures are logged and leave the last frame in place; the
//! viewer keeps running until `Ctrl-C`.

mod error;
mod input;
mod render;

use std::path::Path;
use std::sync::Arc;

use gridsync_client::{ClientConfig, CommandEmitter, ConnectionState, ViewerSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ViewerError;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "GRIDSYNC_CONFIG";

/// Configuration file read from the working directory when present.
const DEFAULT_CONFIG_FILE: &str = "gridsync.yaml";

/// Application entry point.
///
/// Loads configuration, initializes logging, connects, then renders frames
/// and forwards stdin commands until interrupted.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or is invalid.
#[tokio::main]
async fn main() -> Result<(), ViewerError> {
    let config = load_config()?;
    init_logging(&config);

    info!(
        endpoint = config.transport.endpoint,
        wire_format = ?config.transport.wire_format,
        grid_range = config.render.grid_range,
        "gridsync-viewer starting"
    );

    let mut session = ViewerSession::mount(&config)?;
    let grid = session.reference_grid();
    info!(size = grid.size, divisions = grid.divisions, "reference grid");

    let state = session.connect().await;
    if state != ConnectionState::Open {
        warn!(%state, "engine unavailable; the display stays empty");
    }

    let input = tokio::spawn(read_commands(session.emitter()));
    let mut frames = session.frames();
    let mut states = session.state_changes();
    let mut watching_state = !state.is_terminal();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    render::draw(&frames.borrow_and_update());
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                info!("shutdown requested");
                break;
            }

            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = Arc::clone(&frames.borrow_and_update());
                render::draw(&frame);
            }

            changed = states.changed(), if watching_state => {
                let state = *states.borrow_and_update();
                if changed.is_err() || state.is_terminal() {
                    watching_state = false;
                    warn!(%state, "connection ended; keeping the last frame");
                } else {
                    info!(%state, "connection state changed");
                }
            }
        }
    }

    input.abort();
    let stats = session.stats();
    session.unmount().await;
    info!(
        batches_applied = stats.batches_applied,
        decode_failures = stats.decode_failures,
        cells_rejected = stats.cells_rejected,
        commands_sent = stats.commands_sent,
        commands_rejected = stats.commands_rejected,
        "gridsync-viewer stopped"
    );
    Ok(())
}

/// Resolve the configuration: `$GRIDSYNC_CONFIG`, then `gridsync.yaml`, then
/// built-in defaults. The endpoint override applies in every case.
fn load_config() -> Result<ClientConfig, ViewerError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(ClientConfig::from_file(Path::new(&path))?);
    }
    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.exists() {
        return Ok(ClientConfig::from_file(fallback)?);
    }
    Ok(ClientConfig::parse("")?)
}

fn init_logging(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Forward stdin lines to the engine until stdin closes.
async fn read_commands(emitter: CommandEmitter) -> Result<(), ViewerError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match input::parse_line(&line) {
            Ok(Some(command)) => {
                if let Err(e) = emitter.inject(command) {
                    debug!(error = %e, "injection not sent");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, line, "ignoring input line"),
        }
    }
    debug!("stdin closed");
    Ok(())
}
