//! `WebSocket` transport to the simulation engine.
//!
//! A [`Transport`] owns the single connection for one viewer mount. Its
//! lifecycle is `Idle -> Connecting -> Open -> {Closed, Errored}`; both
//! terminal states are absorbing and nothing reconnects automatically.
//!
//! Once open, one background task owns the socket and multiplexes three
//! sources with `tokio::select!`: the shutdown signal, outbound payloads
//! from [`CommandSender`] handles, and inbound frames, which are passed to
//! the registered message handler while the connection is still `Open`.

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::error::SyncError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Consumer of inbound raw payloads.
pub type MessageHandler = Box<dyn FnMut(&str) + Send + 'static>;

type SharedHandler = Arc<Mutex<Option<MessageHandler>>>;

/// Lifecycle state of the engine connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Created, not yet opened.
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Inbound deltas are processed and commands may be sent.
    Open,
    /// Closed locally or by the engine. Terminal.
    Closed,
    /// The connection failed or dropped. Terminal.
    Errored,
}

impl ConnectionState {
    /// Whether no transition leaves this state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Connecting | Self::Closed)
                | (Self::Connecting, Self::Open | Self::Closed | Self::Errored)
                | (Self::Open, Self::Closed | Self::Errored)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Move to `next` if the lifecycle allows it. Returns whether it moved.
fn advance(state: &watch::Sender<ConnectionState>, next: ConnectionState) -> bool {
    state.send_if_modified(|current| {
        if current.can_transition_to(next) {
            *current = next;
            true
        } else {
            false
        }
    })
}

/// Capability to send raw payloads over the transport.
///
/// Cheap to clone. Holds no reference to the socket itself: payloads are
/// handed to the connection task, and only while the state is `Open`.
#[derive(Debug, Clone)]
pub struct CommandSender {
    state: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<String>,
}

impl CommandSender {
    /// Send one payload if the connection is open.
    ///
    /// Nothing is queued for later: a payload sent in any other state is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CommandRejected`] if the connection is not
    /// `Open`.
    pub fn send(&self, payload: String) -> Result<(), SyncError> {
        let state = *self.state.borrow();
        if state != ConnectionState::Open {
            warn!(state = %state, "command rejected: connection not open");
            return Err(SyncError::CommandRejected { state });
        }
        if self.outbound.send(payload).is_err() {
            warn!("command rejected: connection task has exited");
            return Err(SyncError::CommandRejected {
                state: ConnectionState::Closed,
            });
        }
        Ok(())
    }

    /// The connection state as of now.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

/// The single bidirectional connection to the engine.
pub struct Transport {
    endpoint: String,
    state: Arc<watch::Sender<ConnectionState>>,
    handler: SharedHandler,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Option<mpsc::UnboundedReceiver<String>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Transport {
    /// Create an idle transport for `endpoint` (e.g. `ws://127.0.0.1:9001`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            endpoint: endpoint.into(),
            state: Arc::new(state),
            handler: Arc::new(Mutex::new(None)),
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            shutdown: None,
            task: None,
        }
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The connection state as of now.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Register the consumer of inbound payloads, replacing any previous one.
    pub fn on_message(&self, handler: impl FnMut(&str) + Send + 'static) {
        let mut slot = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.replace(Box::new(handler)).is_some() {
            debug!("replaced previous message handler");
        }
    }

    /// A sending capability bound to this connection.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            state: self.state.subscribe(),
            outbound: self.outbound_tx.clone(),
        }
    }

    /// Send one raw payload if the connection is open.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CommandRejected`] if the connection is not
    /// `Open`.
    pub fn send(&self, payload: String) -> Result<(), SyncError> {
        self.command_sender().send(payload)
    }

    /// Connect to the engine.
    ///
    /// Failure is not returned to the caller: it is logged and leaves the
    /// transport `Errored`. A transport can only be opened once, from
    /// `Idle`. Returns the resulting state.
    pub async fn open(&mut self) -> ConnectionState {
        if !advance(&self.state, ConnectionState::Connecting) {
            let current = self.state();
            warn!(state = %current, "transport can only be opened from idle");
            return current;
        }

        info!(endpoint = %self.endpoint, "connecting to simulation engine");
        let socket = match connect_async(self.endpoint.as_str()).await {
            Ok((socket, _response)) => socket,
            Err(e) => {
                warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "transport error: connection failed"
                );
                advance(&self.state, ConnectionState::Errored);
                return self.state();
            }
        };

        let Some(outbound) = self.outbound_rx.take() else {
            warn!("transport error: outbound channel already consumed");
            advance(&self.state, ConnectionState::Errored);
            return self.state();
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        advance(&self.state, ConnectionState::Open);
        info!(endpoint = %self.endpoint, "connection open");

        self.shutdown = Some(shutdown_tx);
        self.task = Some(tokio::spawn(pump(
            socket,
            outbound,
            shutdown_rx,
            Arc::clone(&self.state),
            Arc::clone(&self.handler),
        )));
        self.state()
    }

    /// Close the connection.
    ///
    /// Idempotent: safe to call repeatedly, before `open`, or after the
    /// connection already failed. Waits for the connection task to finish
    /// so no payload is dispatched after this returns.
    pub async fn close(&mut self) {
        let previous = self.state();
        if advance(&self.state, ConnectionState::Closed) {
            info!(from = %previous, "transport closed");
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "connection task ended abnormally");
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        advance(&self.state, ConnectionState::Closed);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Connection task: owns the socket until shutdown, remote close, or error.
async fn pump(
    mut socket: Socket,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut shutdown: oneshot::Receiver<()>,
    state: Arc<watch::Sender<ConnectionState>>,
    handler: SharedHandler,
) {
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                // Commands accepted while open are still delivered.
                while let Ok(payload) = outbound.try_recv() {
                    if let Err(e) = socket.send(Message::Text(payload.into())).await {
                        debug!(error = %e, "flush on close failed");
                        break;
                    }
                }
                if let Err(e) = socket.close(None).await {
                    debug!(error = %e, "close handshake failed");
                }
                return;
            }

            Some(payload) = outbound.recv() => {
                if let Err(e) = socket.send(Message::Text(payload.into())).await {
                    warn!(error = %e, "transport error: send failed");
                    advance(&state, ConnectionState::Errored);
                    return;
                }
            }

            frame = socket.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => dispatch(&state, &handler, text.as_str()),
                    Some(Ok(Message::Binary(bytes))) => match core::str::from_utf8(&bytes) {
                        Ok(text) => dispatch(&state, &handler, text),
                        Err(e) => warn!(error = %e, "dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        info!(frame = ?frame, "engine closed the connection");
                        advance(&state, ConnectionState::Closed);
                        return;
                    }
                    Some(Ok(_)) => {
                        // Ping, pong, and raw frames are handled by tungstenite.
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "transport error: connection dropped");
                        advance(&state, ConnectionState::Errored);
                        return;
                    }
                    None => {
                        info!("engine stream ended");
                        advance(&state, ConnectionState::Closed);
                        return;
                    }
                }
            }
        }
    }
}

/// Hand one payload to the registered handler, unless teardown has begun.
fn dispatch(state: &watch::Sender<ConnectionState>, handler: &SharedHandler, payload: &str) {
    if *state.borrow() != ConnectionState::Open {
        debug!("dropping payload received after teardown");
        return;
    }
    let mut slot = handler.lock().unwrap_or_else(PoisonError::into_inner);
    match slot.as_mut() {
        Some(handle) => handle(payload),
        None => debug!("no message handler registered, payload dropped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_absorbing() {
        use ConnectionState::{Closed, Connecting, Errored, Idle, Open};
        for terminal in [Closed, Errored] {
            assert!(terminal.is_terminal());
            for next in [Idle, Connecting, Open, Closed, Errored] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        use ConnectionState::{Closed, Connecting, Errored, Idle, Open};
        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Open));
        assert!(Open.can_transition_to(Errored));
        assert!(!Open.can_transition_to(Connecting));
        assert!(!Idle.can_transition_to(Open));
        assert!(!Connecting.can_transition_to(Idle));
        assert!(Idle.can_transition_to(Closed));
    }

    #[test]
    fn advance_refuses_to_leave_terminal_state() {
        let (state, _) = watch::channel(ConnectionState::Idle);
        assert!(advance(&state, ConnectionState::Closed));
        assert!(!advance(&state, ConnectionState::Connecting));
        assert_eq!(*state.borrow(), ConnectionState::Closed);
    }

    #[test]
    fn send_before_open_is_rejected() {
        let transport = Transport::new("ws://127.0.0.1:1");
        let result = transport.send("{}".to_owned());
        assert!(matches!(
            result,
            Err(SyncError::CommandRejected {
                state: ConnectionState::Idle
            })
        ));
    }

    #[tokio::test]
    async fn close_is_idempotent_from_idle() {
        let mut transport = Transport::new("ws://127.0.0.1:1");
        transport.close().await;
        transport.close().await;
        assert_eq!(transport.state(), ConnectionState::Closed);
        assert_eq!(transport.open().await, ConnectionState::Closed);
    }

    #[test]
    fn dispatch_skips_payloads_once_closed() {
        let (state, _) = watch::channel(ConnectionState::Open);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let record: MessageHandler = Box::new(move |p: &str| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(p.to_owned());
        });
        let handler: SharedHandler = Arc::new(Mutex::new(Some(record)));

        dispatch(&state, &handler, "first");
        advance(&state, ConnectionState::Closed);
        dispatch(&state, &handler, "second");

        let seen = seen.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(seen.as_slice(), ["first".to_owned()]);
    }
}
