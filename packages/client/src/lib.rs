//! # Pulsewire client core
//!
//! Streaming transport for long-running backend operations. Progress and
//! results reach the caller over two channels: a chunked NDJSON-over-HTTP
//! response and a persistent push connection that reconnects on its own.
//!
//! ## Features
//!
//! - **NDJSON decoding** of byte streams split at arbitrary chunk boundaries
//! - **Request execution** with a time-to-headers timeout and content-type
//!   driven body handling
//! - **Named push connections** with a state machine and exponential backoff
//! - **Progress correlation** of push messages and status polls into one
//!   ordered timeline, first terminal status wins
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pulsewire_client::{ClientConfig, ConnectionManager, Operation, ProgressCorrelator, Request,
//!     RequestExecutor, WsTransport};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> pulsewire_client::Result<()> {
//! let config = ClientConfig::new("http://localhost:8000").map_err(pulsewire_client::error::builder)?;
//! let executor = RequestExecutor::new(config.clone())?;
//! let connections = ConnectionManager::new(WsTransport::from_config(&config)?, config.reconnect.clone());
//! let mut correlator = ProgressCorrelator::new(connections, executor, config.progress.clone());
//!
//! let operation = Operation::new("ingest", "ws/ingest/")
//!     .with_poll(Request::get("api/ingest/status/"));
//! let timeline = correlator
//!     .observe(&operation, &CancellationToken::new(), |event| {
//!         println!("{:?} {} {:.0}%", event.source, event.status, event.progress);
//!     })
//!     .await?;
//! println!("finished: {:?}", timeline.outcome());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod http;
pub mod progress;
pub mod push;
pub mod retry;

pub mod prelude;

pub use crate::prelude::*;
