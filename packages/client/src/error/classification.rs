use http::StatusCode;

use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error is from a request builder or configuration.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Returns true if no response headers arrived within the timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    /// Returns true if the server answered with a non-2xx status.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.inner.kind, Kind::Status(_))
    }

    /// Returns the status code, if the error was generated from a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self.inner.kind {
            Kind::Status(code) => Some(code),
            _ => None,
        }
    }

    /// Returns true if the error is related to sending the request
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self.inner.kind, Kind::Request)
    }

    /// Returns true if a push connection could not be established
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    #[must_use]
    pub fn is_transport_closed(&self) -> bool {
        matches!(self.inner.kind, Kind::TransportClosed)
    }

    /// Returns true for a malformed NDJSON line or push message
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self.inner.kind, Kind::Parse)
    }

    #[must_use]
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self.inner.kind, Kind::PayloadTooLarge)
    }

    /// Returns true once a push connection has stopped reconnecting.
    #[must_use]
    pub fn is_reconnect_exhausted(&self) -> bool {
        matches!(self.inner.kind, Kind::ReconnectExhausted)
    }

    /// Returns true if the stream or connection that produced this error
    /// keeps running after it was reported.
    ///
    /// Parse failures are local to one record, and connect or transport
    /// failures on a push connection are followed by a reconnect attempt.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::Parse | Kind::PayloadTooLarge | Kind::Connect | Kind::TransportClosed
        )
    }
}
