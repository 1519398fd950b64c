//! Transport seam under the connection manager
//!
//! The manager only needs to open a session for an endpoint, read text
//! frames, write text frames and close. [`super::WsTransport`] is the
//! WebSocket implementation; tests substitute scripted transports.

use std::future::Future;

use super::handlers::CloseReason;
use crate::error::Result;

/// One inbound event from a push session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    /// A text message, not yet parsed
    Text(String),
    /// The remote side closed the session
    Closed(CloseReason),
}

pub trait PushSession: Send + 'static {
    /// Await the next inbound frame.
    ///
    /// Must be cancel-safe: the driver races it against outbound writes and
    /// shutdown, dropping the future when another branch wins. A `Parse`
    /// error reports one undecodable frame and leaves the session usable;
    /// any other error ends the session.
    fn recv(&mut self) -> impl Future<Output = Result<PushFrame>> + Send;

    fn send(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Close the session from this side. Errors are not reported.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

pub trait PushTransport: Send + Sync + 'static {
    type Session: PushSession;

    /// Open a session to `endpoint`, a path relative to the transport's base.
    fn open(&self, endpoint: &str) -> impl Future<Output = Result<Self::Session>> + Send;
}
