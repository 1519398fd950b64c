//! Merges push messages and status polls into one operation timeline

use futures::future::BoxFuture;
use futures::stream::{Empty, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::event::{EventNormalizer, EventSource, ProgressEvent};
use super::poll::StatusPoller;
use super::timeline::{OperationTimeline, Outcome};
use crate::config::ProgressConfig;
use crate::error::{self, Error, Result};
use crate::http::Request;
use crate::push::{CloseReason, ConnectionHandlers, ConnectionManager, PushTransport};

/// One observable backend operation: where its events are pushed, how its
/// status is polled, and what to say on the push channel at start and
/// cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub push_endpoint: String,
    pub poll: Option<Request>,
    /// Sent once, the first time the push connection opens
    pub start_message: Option<Value>,
    /// Sent best effort when the caller cancels
    pub cancel_message: Option<Value>,
}

impl Operation {
    pub fn new(name: impl Into<String>, push_endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            push_endpoint: push_endpoint.into(),
            poll: None,
            start_message: None,
            cancel_message: None,
        }
    }

    #[must_use]
    pub fn with_poll(mut self, request: Request) -> Self {
        self.poll = Some(request);
        self
    }

    #[must_use]
    pub fn with_start_message(mut self, message: Value) -> Self {
        self.start_message = Some(message);
        self
    }

    #[must_use]
    pub fn with_cancel_message(mut self, message: Value) -> Self {
        self.cancel_message = Some(message);
        self
    }
}

enum Signal {
    Opened,
    Message(Value),
    Error(Error),
    Closed(CloseReason),
}

/// Drives one operation at a time over a push connection and a status poll.
///
/// Arrival order is the only order: events from the two sources are
/// appended as they come in, each one reported to the caller before the next
/// is handled. The first completed or failed status from either source ends
/// the operation.
pub struct ProgressCorrelator<T: PushTransport, P: StatusPoller> {
    connections: ConnectionManager<T>,
    poller: P,
    config: ProgressConfig,
}

impl<T: PushTransport, P: StatusPoller> ProgressCorrelator<T, P> {
    pub fn new(connections: ConnectionManager<T>, poller: P, config: ProgressConfig) -> Self {
        Self {
            connections,
            poller,
            config,
        }
    }

    pub fn connections(&self) -> &ConnectionManager<T> {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager<T> {
        &mut self.connections
    }

    pub fn poller(&self) -> &P {
        &self.poller
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    pub fn into_parts(self) -> (ConnectionManager<T>, P) {
        (self.connections, self.poller)
    }

    /// Observe `operation` until it reaches a terminal status, `cancel`
    /// fires, or both sources are lost.
    ///
    /// Opens a push connection named after the operation and, if the
    /// operation has a poll request, polls it every `poll_interval` starting
    /// one interval from now. `on_event` runs after every append. A failed
    /// poll stops polling only. On return the push connection is closed.
    ///
    /// # Errors
    ///
    /// `Builder` for an operation with an empty name or push endpoint. Every
    /// other failure ends up in the timeline's outcome.
    pub async fn observe<F>(
        &mut self,
        operation: &Operation,
        cancel: &CancellationToken,
        on_event: F,
    ) -> Result<OperationTimeline>
    where
        F: FnMut(&ProgressEvent),
    {
        self.drive(operation, None::<Empty<Result<Value>>>, cancel, on_event)
            .await
    }

    /// Like [`observe`](Self::observe), with the records of the response
    /// that started the operation as a third source.
    ///
    /// Stream records are appended as [`EventSource::Stream`] events under
    /// the same first-terminal-wins rule. Malformed or oversized records are
    /// skipped; a transport error or the end of the body stops this source
    /// only.
    ///
    /// # Errors
    ///
    /// Same as [`observe`](Self::observe).
    pub async fn observe_stream<S, F>(
        &mut self,
        operation: &Operation,
        records: S,
        cancel: &CancellationToken,
        on_event: F,
    ) -> Result<OperationTimeline>
    where
        S: Stream<Item = Result<Value>> + Unpin,
        F: FnMut(&ProgressEvent),
    {
        self.drive(operation, Some(records), cancel, on_event).await
    }

    async fn drive<S, F>(
        &mut self,
        operation: &Operation,
        mut records: Option<S>,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<OperationTimeline>
    where
        S: Stream<Item = Result<Value>> + Unpin,
        F: FnMut(&ProgressEvent),
    {
        if operation.name.trim().is_empty() || operation.push_endpoint.trim().is_empty() {
            return Err(error::builder("operation needs a name and a push endpoint"));
        }

        let name = operation.name.as_str();
        let (signal_tx, mut signals) = mpsc::unbounded_channel();
        self.connections
            .connect(name, operation.push_endpoint.as_str(), signal_handlers(signal_tx))
            .await;
        tracing::info!(operation = %name, endpoint = %operation.push_endpoint, "observing operation");

        let mut timeline = OperationTimeline::new(name);
        let mut normalizer = EventNormalizer::new(self.config.status.clone());

        let period = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polling = operation.poll.is_some();
        let mut in_flight: Option<BoxFuture<'_, Result<Value>>> = None;

        let mut streaming = records.is_some();
        let mut push_lost = false;
        let mut signals_open = true;
        let mut started = false;

        loop {
            if push_lost && !polling && !streaming {
                tracing::warn!(operation = %name, "push connection failed and polling stopped");
                timeline.finish(Outcome::SourcesLost);
                break;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    if let Some(message) = &operation.cancel_message {
                        if let Err(e) = self.connections.send(name, message) {
                            tracing::debug!(operation = %name, error = %e, "cancel message not sent");
                        }
                    }
                    tracing::info!(operation = %name, "operation cancelled");
                    timeline.finish(Outcome::Cancelled);
                    break;
                }
                signal = signals.recv(), if signals_open => match signal {
                    Some(Signal::Opened) => {
                        if started {
                            tracing::debug!(operation = %name, "push connection reopened");
                        } else if let Some(message) = &operation.start_message {
                            match self.connections.send(name, message) {
                                Ok(()) => started = true,
                                Err(e) => tracing::warn!(operation = %name, error = %e, "start message not sent"),
                            }
                        }
                    }
                    Some(Signal::Message(payload)) => {
                        on_event(timeline.append(normalizer.normalize(EventSource::Push, payload)));
                        if timeline.is_terminal() {
                            break;
                        }
                    }
                    Some(Signal::Error(e)) if e.is_reconnect_exhausted() => push_lost = true,
                    Some(Signal::Error(e)) => {
                        tracing::debug!(operation = %name, error = %e, "push error");
                    }
                    Some(Signal::Closed(reason)) => {
                        tracing::debug!(operation = %name, %reason, "push connection closed by server");
                    }
                    // the driver gave up and dropped its handlers
                    None => {
                        signals_open = false;
                        push_lost = true;
                    }
                },
                record = next_record(&mut records), if streaming => match record {
                    Some(Ok(payload)) => {
                        on_event(timeline.append(normalizer.normalize(EventSource::Stream, payload)));
                        if timeline.is_terminal() {
                            break;
                        }
                    }
                    Some(Err(e)) if e.is_parse() || e.is_payload_too_large() => {
                        tracing::debug!(operation = %name, error = %e, "skipping start stream record");
                    }
                    Some(Err(e)) => {
                        tracing::warn!(operation = %name, error = %e, "start stream failed");
                        streaming = false;
                    }
                    None => {
                        tracing::debug!(operation = %name, "start stream ended");
                        streaming = false;
                    }
                },
                result = settle(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    match result {
                        Ok(payload) => {
                            on_event(timeline.append(normalizer.normalize(EventSource::Poll, payload)));
                            if timeline.is_terminal() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(operation = %name, error = %e, "status poll failed; polling stopped");
                            polling = false;
                        }
                    }
                }
                _ = ticker.tick(), if polling && in_flight.is_none() => {
                    if let Some(request) = &operation.poll {
                        in_flight = Some(Box::pin(self.poller.poll(request)));
                    }
                }
            }
        }

        drop(in_flight);
        drop(records);
        self.connections.close(name).await;
        tracing::info!(
            operation = %name,
            outcome = ?timeline.outcome(),
            events = timeline.len(),
            "operation finished"
        );
        Ok(timeline)
    }
}

fn signal_handlers(tx: mpsc::UnboundedSender<Signal>) -> ConnectionHandlers {
    let opened = tx.clone();
    let messages = tx.clone();
    let errors = tx.clone();
    ConnectionHandlers::new()
        .on_open(move || {
            let _ = opened.send(Signal::Opened);
        })
        .on_message(move |message| {
            let _ = messages.send(Signal::Message(message));
        })
        .on_error(move |error| {
            let _ = errors.send(Signal::Error(error));
        })
        .on_close(move |reason| {
            let _ = tx.send(Signal::Closed(reason));
        })
}

async fn next_record<S>(records: &mut Option<S>) -> Option<Result<Value>>
where
    S: Stream<Item = Result<Value>> + Unpin,
{
    match records {
        Some(records) => records.next().await,
        None => std::future::pending().await,
    }
}

async fn settle(in_flight: &mut Option<BoxFuture<'_, Result<Value>>>) -> Result<Value> {
    match in_flight {
        Some(poll) => poll.await,
        None => std::future::pending().await,
    }
}
