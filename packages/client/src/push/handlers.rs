//! Per-connection event handlers.
//!
//! Each named connection carries one fixed [`ConnectionHandlers`] record.
//! All handlers are optional and run on the connection's driver task, in the
//! order the transport produced the underlying events:
//!
//! - `on_open`: the transport finished its handshake
//! - `on_message`: an inbound message parsed as JSON
//! - `on_error`: a malformed message, a transport failure, or
//!   `ReconnectExhausted` once the connection gives up
//! - `on_close`: the remote side closed the connection
//!
//! ```rust
//! use pulsewire_client::push::ConnectionHandlers;
//!
//! let handlers = ConnectionHandlers::new()
//!     .on_open(|| println!("connected"))
//!     .on_message(|message| println!("event: {message}"))
//!     .on_error(|error| eprintln!("push error: {error}"));
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;

/// Why a push connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// Human-readable description of why the connection closed.
    pub message: String,
    /// WebSocket close code, if available (e.g. 1000 = normal, 1006 = abnormal).
    pub code: Option<u16>,
}

impl CloseReason {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "{} (code: {})", self.message, code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

pub type OnOpenCallback = Arc<dyn Fn() + Send + Sync>;

pub type OnMessageCallback = Arc<dyn Fn(Value) + Send + Sync>;

pub type OnErrorCallback = Arc<dyn Fn(Error) + Send + Sync>;

pub type OnCloseCallback = Arc<dyn Fn(CloseReason) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ConnectionHandlers {
    on_open: Option<OnOpenCallback>,
    on_message: Option<OnMessageCallback>,
    on_error: Option<OnErrorCallback>,
    on_close: Option<OnCloseCallback>,
}

impl ConnectionHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_message(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl Fn(Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_close(mut self, f: impl Fn(CloseReason) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    pub(crate) fn emit_open(&self) {
        if let Some(cb) = &self.on_open {
            cb();
        }
    }

    pub(crate) fn emit_message(&self, message: Value) {
        if let Some(cb) = &self.on_message {
            cb(message);
        }
    }

    pub(crate) fn emit_error(&self, error: Error) {
        if let Some(cb) = &self.on_error {
            cb(error);
        }
    }

    pub(crate) fn emit_close(&self, reason: CloseReason) {
        if let Some(cb) = &self.on_close {
            cb(reason);
        }
    }
}

impl fmt::Debug for ConnectionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandlers")
            .field("on_open", &self.on_open.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}
