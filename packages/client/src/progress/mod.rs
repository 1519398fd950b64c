//! Progress correlation across push and poll
//!
//! A [`ProgressCorrelator`] watches one [`Operation`] through two sources:
//! the operation's push connection and a fixed-interval status poll. Both
//! are normalized into [`ProgressEvent`]s and appended to an
//! [`OperationTimeline`] in arrival order.

pub mod correlator;
pub mod event;
pub mod poll;
pub mod timeline;

pub use correlator::{Operation, ProgressCorrelator};
pub use event::{EventNormalizer, EventSource, ProgressEvent, StatusPhase, UNKNOWN_STATUS};
pub use poll::StatusPoller;
pub use timeline::{OperationTimeline, Outcome};
