//! Task that owns one push session and its reconnect loop

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::handlers::{CloseReason, ConnectionHandlers};
use super::state::ConnectionState;
use super::transport::{PushFrame, PushSession, PushTransport};
use crate::error::{self, Error};
use crate::retry::ReconnectPolicy;

pub(crate) struct Driver<T: PushTransport> {
    pub(crate) name: String,
    pub(crate) endpoint: String,
    pub(crate) transport: Arc<T>,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) handlers: ConnectionHandlers,
    pub(crate) state: watch::Sender<ConnectionState>,
    pub(crate) attempts: Arc<AtomicU32>,
    pub(crate) outbound: mpsc::UnboundedReceiver<String>,
    pub(crate) shutdown: CancellationToken,
}

enum Loss {
    Closed(CloseReason),
    Failed(Error),
}

impl<T: PushTransport> Driver<T> {
    /// Connect, pump, and reconnect until shut down or out of attempts.
    ///
    /// `attempt` counts reconnects since the last successful open. After a
    /// loss, `attempt < max_attempts` schedules another try after
    /// `policy.delay_for(attempt)`; otherwise the connection fails.
    pub(crate) async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            self.set_state(ConnectionState::Connecting);
            let opened = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                opened = self.transport.open(&self.endpoint) => opened,
            };

            let loss = match opened {
                Ok(mut session) => {
                    attempt = 0;
                    self.attempts.store(0, Ordering::Relaxed);
                    self.set_state(ConnectionState::Open);
                    tracing::info!(connection = %self.name, "push connection open");
                    self.handlers.emit_open();

                    match self.pump(&mut session).await {
                        Some(loss) => loss,
                        None => {
                            self.set_state(ConnectionState::Closing);
                            self.flush(&mut session).await;
                            session.close().await;
                            break;
                        }
                    }
                }
                Err(e) => Loss::Failed(e),
            };

            match loss {
                Loss::Closed(reason) => {
                    tracing::warn!(connection = %self.name, %reason, "push connection closed by remote");
                    self.handlers.emit_close(reason);
                }
                Loss::Failed(e) => {
                    tracing::warn!(connection = %self.name, error = %e, "push connection lost");
                    self.handlers.emit_error(e.with_connection(&self.name));
                }
            }

            if !self.policy.allows(attempt) {
                self.set_state(ConnectionState::Failed);
                tracing::error!(
                    connection = %self.name,
                    attempts = attempt,
                    "push connection failed; no reconnect attempts left"
                );
                self.handlers
                    .emit_error(error::reconnect_exhausted(&self.name, attempt));
                return;
            }

            self.set_state(ConnectionState::Reconnecting);
            let delay = self.policy.delay_for(attempt);
            tracing::debug!(
                connection = %self.name,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "scheduling reconnect"
            );
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
            self.attempts.store(attempt, Ordering::Relaxed);
        }

        self.set_state(ConnectionState::Closed);
        tracing::debug!(connection = %self.name, "push connection closed");
    }

    /// Pump one open session. `None` means shutdown was requested.
    async fn pump(&mut self, session: &mut T::Session) -> Option<Loss> {
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return None,
                Some(text) = self.outbound.recv() => {
                    if let Err(e) = session.send(text).await {
                        return Some(Loss::Failed(e));
                    }
                }
                frame = session.recv() => match frame {
                    Ok(PushFrame::Text(text)) => self.dispatch(&text),
                    Ok(PushFrame::Closed(reason)) => return Some(Loss::Closed(reason)),
                    Err(e) if e.is_parse() => {
                        tracing::debug!(connection = %self.name, error = %e, "dropping undecodable push frame");
                        self.handlers.emit_error(e.with_connection(&self.name));
                    }
                    Err(e) => return Some(Loss::Failed(e)),
                },
            }
        }
    }

    /// Write frames queued before shutdown was requested.
    async fn flush(&mut self, session: &mut T::Session) {
        while let Ok(text) = self.outbound.try_recv() {
            if session.send(text).await.is_err() {
                break;
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<Value>(text) {
            Ok(message) => self.handlers.emit_message(message),
            Err(e) => {
                tracing::debug!(connection = %self.name, error = %e, "dropping malformed push message");
                self.handlers
                    .emit_error(error::parse(e).with_connection(&self.name));
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::trace!(connection = %self.name, from = %previous, to = %state, "state change");
        }
    }
}
