//! Timeout configuration

pub mod timeout_config;

pub use timeout_config::TimeoutConfig;
