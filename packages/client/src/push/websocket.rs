//! WebSocket push transport over tokio-tungstenite

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::handlers::CloseReason;
use super::transport::{PushFrame, PushSession, PushTransport};
use crate::config::ClientConfig;
use crate::error::{self, Result, TimedOut};

type WebSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens `ws://` sessions relative to a base URL.
#[derive(Debug, Clone)]
pub struct WsTransport {
    base_url: Url,
    connect_timeout: Duration,
}

impl WsTransport {
    pub fn new(base_url: Url, connect_timeout: Duration) -> Self {
        Self {
            base_url,
            connect_timeout,
        }
    }

    /// Build from the client configuration's derived push URL and
    /// `push_connect_timeout`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let base_url = config.push_url().map_err(error::builder)?;
        Ok(Self::new(base_url, config.timeouts.push_connect_timeout))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl PushTransport for WsTransport {
    type Session = WsSession;

    async fn open(&self, endpoint: &str) -> Result<WsSession> {
        let url = self.base_url.join(endpoint).map_err(error::builder)?;
        tracing::debug!(%url, "opening websocket");

        match tokio::time::timeout(self.connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((stream, _response))) => Ok(WsSession { stream }),
            Ok(Err(e)) => Err(error::connect(e).with_url(url)),
            Err(_) => Err(error::connect(TimedOut(self.connect_timeout)).with_url(url)),
        }
    }
}

pub struct WsSession {
    stream: WebSocket,
}

impl PushSession for WsSession {
    async fn recv(&mut self) -> Result<PushFrame> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(error::transport_closed(e)),
                None => return Ok(PushFrame::Closed(CloseReason::new("stream ended"))),
            };

            match message {
                Message::Text(text) => return Ok(PushFrame::Text(text.as_str().to_owned())),
                Message::Binary(data) => {
                    return String::from_utf8(data.to_vec())
                        .map(PushFrame::Text)
                        .map_err(error::parse);
                }
                Message::Close(frame) => {
                    let reason = match frame {
                        Some(frame) => {
                            CloseReason::with_code(frame.reason.as_str(), u16::from(frame.code))
                        }
                        None => CloseReason::new("closed by server"),
                    };
                    return Ok(PushFrame::Closed(reason));
                }
                // tungstenite queues the pong itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(error::transport_closed)
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "websocket close handshake failed");
        }
    }
}
