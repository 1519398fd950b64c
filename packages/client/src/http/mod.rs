//! HTTP request and response types used by the request executor

pub mod request;
pub mod response;

pub use request::Request;
pub use response::{ByteStream, ContentKind, ParsedBody, ResponseStream};
