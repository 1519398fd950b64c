//! Pulsewire public API
//!
//! Runs long-running research backend operations (paper ingestion and
//! research analysis) and reports their progress as one timeline merged
//! from the push channel and status polls.
//!
//! ```rust,no_run
//! use pulsewire::Pulsewire;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> pulsewire::Result<()> {
//! let mut client = Pulsewire::connect("http://localhost:8000")?;
//! let timeline = client
//!     .ingestion()
//!     .days(3)
//!     .max_results(50)
//!     .run(&CancellationToken::new(), |event| {
//!         println!("{} {:.0}%", event.status, event.progress);
//!     })
//!     .await?;
//! println!("outcome: {:?}", timeline.outcome());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

pub use builder::*;

// Re-export important types from client package
pub use pulsewire_client::{
    ClientConfig, Error, EventSource, Kind, OperationTimeline, Outcome, ProgressConfig,
    ProgressEvent, ReconnectPolicy, Result, StatusContract, StatusPhase, TimeoutConfig,
};
pub use tokio_util::sync::CancellationToken;
