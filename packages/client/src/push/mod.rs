//! Named push connections with automatic reconnect
//!
//! [`ConnectionManager`] keeps a table of named connections. Each one walks
//! the [`ConnectionState`] machine on its own task, reconnecting with
//! exponential backoff after unexpected loss until the policy runs out.

mod driver;
pub mod handlers;
pub mod manager;
pub mod state;
pub mod transport;
pub mod websocket;

pub use handlers::{CloseReason, ConnectionHandlers};
pub use manager::ConnectionManager;
pub use state::ConnectionState;
pub use transport::{PushFrame, PushSession, PushTransport};
pub use websocket::{WsSession, WsTransport};
