//! Shared test doubles: a scripted push transport, a scripted status poller
//! and a handler recorder.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use pulsewire_client::error::{self, Error, Kind};
use pulsewire_client::http::Request;
use pulsewire_client::progress::StatusPoller;
use pulsewire_client::push::{CloseReason, ConnectionHandlers, PushFrame, PushSession, PushTransport};
use pulsewire_client::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------- transport

/// What the next `open` call does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Accept,
    Refuse,
}

struct Script {
    queued: VecDeque<OpenOutcome>,
    fallback: OpenOutcome,
    opens: Vec<Instant>,
}

/// Push transport whose `open` outcomes are scripted. Every accepted session
/// hands a [`SessionControl`] to the test through the receiver returned by
/// the constructor.
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    sessions: mpsc::UnboundedSender<SessionControl>,
}

impl ScriptedTransport {
    pub fn accepting() -> (Self, mpsc::UnboundedReceiver<SessionControl>) {
        Self::scripted([], OpenOutcome::Accept)
    }

    pub fn refusing() -> (Self, mpsc::UnboundedReceiver<SessionControl>) {
        Self::scripted([], OpenOutcome::Refuse)
    }

    /// Play `queued` first, then `fallback` forever.
    pub fn scripted(
        queued: impl IntoIterator<Item = OpenOutcome>,
        fallback: OpenOutcome,
    ) -> (Self, mpsc::UnboundedReceiver<SessionControl>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            script: Arc::new(Mutex::new(Script {
                queued: queued.into_iter().collect(),
                fallback,
                opens: Vec::new(),
            })),
            sessions: tx,
        };
        (transport, rx)
    }

    /// Shared log of the instants `open` was called.
    pub fn open_log(&self) -> OpenLog {
        OpenLog(Arc::clone(&self.script))
    }
}

#[derive(Clone)]
pub struct OpenLog(Arc<Mutex<Script>>);

impl OpenLog {
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().opens.len()
    }

    /// Milliseconds from `start` to each open.
    pub fn offsets_ms(&self, start: Instant) -> Vec<u64> {
        self.0
            .lock()
            .unwrap()
            .opens
            .iter()
            .map(|at| at.duration_since(start).as_millis() as u64)
            .collect()
    }
}

impl PushTransport for ScriptedTransport {
    type Session = ScriptedSession;

    async fn open(&self, endpoint: &str) -> Result<ScriptedSession> {
        let outcome = {
            let mut script = self.script.lock().unwrap();
            script.opens.push(Instant::now());
            let fallback = script.fallback;
            script.queued.pop_front().unwrap_or(fallback)
        };

        match outcome {
            OpenOutcome::Refuse => Err(error::connect(format!("refused: {endpoint}"))),
            OpenOutcome::Accept => {
                let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
                let (sent_tx, sent_rx) = mpsc::unbounded_channel();
                let closed = Arc::new(AtomicBool::new(false));
                let _ = self.sessions.send(SessionControl {
                    endpoint: endpoint.to_string(),
                    inbound: inbound_tx,
                    sent: sent_rx,
                    closed: Arc::clone(&closed),
                });
                Ok(ScriptedSession {
                    inbound: inbound_rx,
                    sent: sent_tx,
                    closed,
                })
            }
        }
    }
}

pub struct ScriptedSession {
    inbound: mpsc::UnboundedReceiver<Result<PushFrame>>,
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl PushSession for ScriptedSession {
    async fn recv(&mut self) -> Result<PushFrame> {
        match self.inbound.recv().await {
            Some(frame) => frame,
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, text: String) -> Result<()> {
        self.sent
            .send(text)
            .map_err(|_| error::transport_closed("test dropped the session"))
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// The test's end of one accepted session
pub struct SessionControl {
    pub endpoint: String,
    inbound: mpsc::UnboundedSender<Result<PushFrame>>,
    pub sent: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl SessionControl {
    pub fn push_text(&self, text: &str) {
        let _ = self.inbound.send(Ok(PushFrame::Text(text.to_string())));
    }

    pub fn push_json(&self, value: Value) {
        self.push_text(&value.to_string());
    }

    pub fn remote_close(&self, reason: CloseReason) {
        let _ = self.inbound.send(Ok(PushFrame::Closed(reason)));
    }

    pub fn fail(&self) {
        let _ = self
            .inbound
            .send(Err(error::transport_closed("connection reset by peer")));
    }

    /// Whether the client closed this session from its side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn next_sent_json(&mut self) -> Value {
        let text = self.sent.recv().await.expect("session dropped");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }
}

// ---------------------------------------------------------------- recorder

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Open,
    Message(Value),
    Error(Kind),
    Close(Option<u16>),
}

/// Handlers that forward every callback to a channel, in call order.
pub fn recorder() -> (ConnectionHandlers, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (open, message, err, close) = (tx.clone(), tx.clone(), tx.clone(), tx);
    let handlers = ConnectionHandlers::new()
        .on_open(move || {
            let _ = open.send(Recorded::Open);
        })
        .on_message(move |value| {
            let _ = message.send(Recorded::Message(value));
        })
        .on_error(move |e: Error| {
            let _ = err.send(Recorded::Error(e.kind().clone()));
        })
        .on_close(move |reason| {
            let _ = close.send(Recorded::Close(reason.code));
        });
    (handlers, rx)
}

/// Everything recorded so far, without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Recorded>) -> Vec<Recorded> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

// ---------------------------------------------------------------- poller

#[derive(Debug, Clone)]
pub enum PollStep {
    Respond(Value),
    RespondAfter(Duration, Value),
    Fail,
    /// Never answers
    Hang,
}

/// Status poller that plays scripted steps, then hangs.
#[derive(Clone)]
pub struct ScriptedPoller {
    steps: Arc<Mutex<VecDeque<PollStep>>>,
    polls: Arc<AtomicUsize>,
}

impl ScriptedPoller {
    pub fn new(steps: impl IntoIterator<Item = PollStep>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn silent() -> Self {
        Self::new([])
    }

    /// Number of polls started so far.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl StatusPoller for ScriptedPoller {
    async fn poll(&self, request: &Request) -> Result<Value> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(PollStep::Respond(value)) => Ok(value),
            Some(PollStep::RespondAfter(delay, value)) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            Some(PollStep::Fail) => {
                let url = url::Url::parse("http://backend.test/")
                    .and_then(|base| base.join(request.path()))
                    .expect("valid test URL");
                Err(error::status_code(url, StatusCode::INTERNAL_SERVER_ERROR))
            }
            Some(PollStep::Hang) | None => std::future::pending().await,
        }
    }
}
