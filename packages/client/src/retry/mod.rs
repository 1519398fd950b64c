//! Reconnect backoff for push connections
//!
//! HTTP calls are surfaced to the caller without retries; only push
//! connections recover automatically, bounded by [`ReconnectPolicy`].

pub mod policy;

pub use policy::ReconnectPolicy;
