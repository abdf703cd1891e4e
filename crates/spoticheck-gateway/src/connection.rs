//! Websocket transport over `tokio-tungstenite`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use spoticheck_core::protocol::{GatewayMessage, Identify, OutboundMessage};
use spoticheck_core::GatewayError;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A live gateway connection shared by the heartbeat and the dispatcher.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Wait for the next frame.
    ///
    /// `Ok(None)` means a frame with no message in it (control frames, blank
    /// text, or a close frame after which [`Connection::is_open`] is false).
    async fn receive(&self) -> Result<Option<GatewayMessage>, GatewayError>;

    async fn send(&self, message: &OutboundMessage) -> Result<(), GatewayError>;

    fn is_open(&self) -> bool;
}

/// Production [`Connection`]. Read and write halves are locked separately so
/// a pending read never blocks a heartbeat.
pub struct WsConnection {
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
    open: AtomicBool,
}

impl WsConnection {
    pub async fn connect(url: &str) -> Result<Self, GatewayError> {
        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| GatewayError::Connection(format!("connect {url}: {e}")))?;
        info!(url, "gateway connected");

        let (writer, reader) = ws.split();
        Ok(Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            open: AtomicBool::new(true),
        })
    }

    fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn receive(&self) -> Result<Option<GatewayMessage>, GatewayError> {
        if !self.is_open() {
            return Err(GatewayError::Closed);
        }
        let mut reader = self.reader.lock().await;
        match reader.next().await {
            Some(Ok(Message::Text(text))) => {
                let text = text.as_str();
                if text.trim().is_empty() {
                    return Ok(None);
                }
                GatewayMessage::decode(text).map(Some)
            }
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "gateway sent close frame");
                self.mark_closed();
                Ok(None)
            }
            Some(Ok(_)) => Ok(None),
            Some(Err(e)) => {
                self.mark_closed();
                Err(GatewayError::Connection(e.to_string()))
            }
            None => {
                self.mark_closed();
                Err(GatewayError::Closed)
            }
        }
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), GatewayError> {
        if !self.is_open() {
            return Err(GatewayError::Closed);
        }
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::text(message.encode()))
            .await
            .map_err(|e| {
                self.mark_closed();
                GatewayError::Connection(format!("send op {}: {e}", message.op))
            })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

/// Read HELLO, send IDENTIFY, and return the heartbeat interval.
///
/// Frames that carry no message are skipped while waiting for HELLO. No reply
/// to IDENTIFY is awaited; a later READY dispatch confirms the session.
pub async fn handshake(
    conn: &dyn Connection,
    identify: &Identify,
) -> Result<Duration, GatewayError> {
    let hello = loop {
        match conn.receive().await {
            Ok(Some(message)) => break message,
            Ok(None) if conn.is_open() => continue,
            Ok(None) => {
                return Err(GatewayError::Handshake(
                    "connection closed before HELLO".into(),
                ))
            }
            Err(GatewayError::Decode(e)) => {
                return Err(GatewayError::Handshake(format!("unreadable HELLO: {e}")))
            }
            Err(e) => return Err(e),
        }
    };

    let interval = hello.heartbeat_interval()?;
    debug!(interval_ms = interval.as_millis() as u64, "received HELLO");

    conn.send(&OutboundMessage::identify(identify)).await?;
    info!(intents = identify.intents, "identify sent");

    Ok(interval)
}
