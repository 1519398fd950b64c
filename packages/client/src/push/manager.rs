//! Named push connection table

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use hashbrown::HashMap;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::driver::Driver;
use super::handlers::ConnectionHandlers;
use super::state::ConnectionState;
use super::transport::PushTransport;
use crate::error::{self, ConnectionClosed, Result};
use crate::retry::ReconnectPolicy;

const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Owns a set of named push connections, each reconnecting on its own
/// under a shared [`ReconnectPolicy`].
///
/// Every connection runs on a spawned driver task; handlers fire on that
/// task. The table itself is only changed through `&mut self`, so callers
/// that share a manager wrap it in their own lock.
///
/// Dropping the manager shuts every connection down without waiting for the
/// close handshakes.
///
/// # Examples
///
/// ```rust,no_run
/// use pulsewire_client::push::{ConnectionHandlers, ConnectionManager, WsTransport};
/// use pulsewire_client::ReconnectPolicy;
/// use std::time::Duration;
///
/// # async fn example() -> pulsewire_client::Result<()> {
/// let transport = WsTransport::new("ws://localhost:8000/".parse().unwrap(), Duration::from_secs(10));
/// let mut manager = ConnectionManager::new(transport, ReconnectPolicy::default());
///
/// let handlers = ConnectionHandlers::new().on_message(|message| println!("{message}"));
/// manager.connect("ingest", "ws/ingest/", handlers).await;
///
/// manager.send("ingest", &serde_json::json!({"type": "cancel"}))?;
/// manager.close("ingest").await;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionManager<T: PushTransport> {
    transport: Arc<T>,
    policy: ReconnectPolicy,
    close_timeout: Duration,
    connections: HashMap<String, ConnectionEntry>,
}

struct ConnectionEntry {
    endpoint: String,
    state: watch::Receiver<ConnectionState>,
    attempts: Arc<AtomicU32>,
    outbound: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<()>,
}

impl ConnectionEntry {
    /// Stop the driver and wait for it, aborting after `grace`.
    ///
    /// Once this returns, no handler of this connection runs again.
    async fn shutdown(self, name: &str, grace: Duration) {
        self.shutdown.cancel();
        let mut task = self.task;
        if tokio::time::timeout(grace, &mut task).await.is_err() {
            tracing::warn!(connection = %name, "close handshake timed out; aborting");
            task.abort();
            let _ = task.await;
        }
    }
}

impl<T: PushTransport> ConnectionManager<T> {
    pub fn new(transport: T, policy: ReconnectPolicy) -> Self {
        Self {
            transport: Arc::new(transport),
            policy,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            connections: HashMap::new(),
        }
    }

    /// How long `close` waits for a close handshake before abandoning it.
    #[must_use]
    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Start a connection named `name` to `endpoint`.
    ///
    /// Returns once the driver task is running; the handshake proceeds in
    /// the background and `on_open` reports its success. An existing
    /// connection with the same name is closed first, and its handlers never
    /// fire again.
    pub async fn connect(
        &mut self,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        handlers: ConnectionHandlers,
    ) {
        let name = name.into();
        let endpoint = endpoint.into();

        if self.close(&name).await {
            tracing::debug!(connection = %name, "replaced existing connection");
        }

        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let attempts = Arc::new(AtomicU32::new(0));

        let driver = Driver {
            name: name.clone(),
            endpoint: endpoint.clone(),
            transport: Arc::clone(&self.transport),
            policy: self.policy.clone(),
            handlers,
            state: state_tx,
            attempts: Arc::clone(&attempts),
            outbound: outbound_rx,
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(driver.run());

        tracing::debug!(connection = %name, %endpoint, "push connection started");
        self.connections.insert(
            name,
            ConnectionEntry {
                endpoint,
                state: state_rx,
                attempts,
                outbound: outbound_tx,
                _guard: shutdown.clone().drop_guard(),
                shutdown,
                task,
            },
        );
    }

    /// Serialize `data` as JSON and send it over the named connection.
    ///
    /// # Errors
    ///
    /// `Builder` if `data` fails to serialize; `TransportClosed` if the
    /// connection is unknown or not currently open.
    pub fn send<D: Serialize + ?Sized>(&self, name: &str, data: &D) -> Result<()> {
        let text = serde_json::to_string(data).map_err(error::builder)?;
        self.send_text(name, text)
    }

    /// Send a raw text frame over the named connection.
    ///
    /// Frames are written in call order. A frame queued just before the
    /// connection drops is discarded with the session.
    pub fn send_text(&self, name: &str, text: impl Into<String>) -> Result<()> {
        let not_open = || error::transport_closed(ConnectionClosed).with_connection(name);

        let entry = self.connections.get(name).ok_or_else(not_open)?;
        if !entry.state.borrow().is_open() {
            return Err(not_open());
        }
        entry.outbound.send(text.into()).map_err(|_| not_open())
    }

    /// Close the named connection and forget it.
    ///
    /// Cancels any pending reconnect. Returns `false` if no such connection
    /// exists. `on_close` is not called for a close requested here.
    pub async fn close(&mut self, name: &str) -> bool {
        match self.connections.remove(name) {
            Some(entry) => {
                entry.shutdown(name, self.close_timeout).await;
                tracing::debug!(connection = %name, "push connection removed");
                true
            }
            None => false,
        }
    }

    /// Close every connection concurrently.
    pub async fn close_all(&mut self) {
        let grace = self.close_timeout;
        let closing = self
            .connections
            .drain()
            .map(|(name, entry)| async move { entry.shutdown(&name, grace).await });
        futures::future::join_all(closing).await;
    }

    #[must_use]
    pub fn is_open(&self, name: &str) -> bool {
        self.state(name).is_some_and(ConnectionState::is_open)
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<ConnectionState> {
        self.connections.get(name).map(|entry| *entry.state.borrow())
    }

    /// Subscribe to state changes of the named connection.
    pub fn watch_state(&self, name: &str) -> Option<watch::Receiver<ConnectionState>> {
        self.connections.get(name).map(|entry| entry.state.clone())
    }

    /// Reconnect attempts made since the connection was last open.
    #[must_use]
    pub fn reconnect_attempts(&self, name: &str) -> Option<u32> {
        self.connections
            .get(name)
            .map(|entry| entry.attempts.load(Ordering::Relaxed))
    }

    pub fn endpoint(&self, name: &str) -> Option<&str> {
        self.connections.get(name).map(|entry| entry.endpoint.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl<T: PushTransport + std::fmt::Debug> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let states: Vec<(&str, ConnectionState)> = self
            .connections
            .iter()
            .map(|(name, entry)| (name.as_str(), *entry.state.borrow()))
            .collect();
        f.debug_struct("ConnectionManager")
            .field("transport", &self.transport)
            .field("policy", &self.policy)
            .field("connections", &states)
            .finish()
    }
}
