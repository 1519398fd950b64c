//! Request description handed to the executor
//!
//! A [`Request`] is immutable once issued: the executor borrows it, resolves
//! the path against the configured base URL and never mutates it.

use std::time::Duration;

use http::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{self, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
    body: Option<Value>,
    timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach any serializable value as a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a builder error if `body` cannot be represented as JSON.
    pub fn json<B: Serialize>(self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(error::builder)?;
        Ok(self.json_value(value))
    }

    /// Override the executor's default time-to-headers limit for this request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[inline]
    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }
}
