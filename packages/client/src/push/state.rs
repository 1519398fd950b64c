use std::fmt;

use serde::Serialize;

/// Lifecycle state of one named push connection.
///
/// ```text
/// Idle → Connecting → Open → Closing → Closed
///          ↑    │       │
///          │    └───────┴──→ Reconnecting ──→ Failed (attempts used up)
///          └─────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Closing,
    Closed,
    Failed,
}

impl ConnectionState {
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// No further transitions happen without a new `connect`.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
