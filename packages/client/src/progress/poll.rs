//! Status poll seam

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::client::RequestExecutor;
use crate::error::{self, Result};
use crate::http::{ParsedBody, Request};

/// Fetches one status document for the correlator's poll loop.
pub trait StatusPoller: Send + Sync {
    fn poll(&self, request: &Request) -> impl Future<Output = Result<Value>> + Send;
}

impl StatusPoller for RequestExecutor {
    /// A body that is not JSON counts as a failed poll.
    async fn poll(&self, request: &Request) -> Result<Value> {
        match self.execute(request).await? {
            ParsedBody::Json(value) => Ok(value),
            ParsedBody::Text(text) => serde_json::from_str(&text).map_err(error::parse),
            ParsedBody::Stream(stream) => Err(error::parse(format!(
                "status endpoint answered with a stream ({})",
                stream.status()
            ))
            .with_url(stream.url().clone())),
        }
    }
}

impl<P: StatusPoller> StatusPoller for Arc<P> {
    fn poll(&self, request: &Request) -> impl Future<Output = Result<Value>> + Send {
        (**self).poll(request)
    }
}
