//! Configuration for the request executor, push connections and progress
//! correlation.
//!
//! Every section has a `Default`, `with_*` builder methods and a `validate()`
//! that reports a [`ConfigurationError`]. All types are serde-serializable so
//! a consumer can load them from its own settings file.

pub mod client;
pub mod progress;
pub mod timeouts;
pub mod validation;

pub use client::ClientConfig;
pub use progress::{ProgressConfig, StatusContract};
pub use timeouts::TimeoutConfig;
pub use validation::{ConfigResult, ConfigValidator, ConfigurationError};
