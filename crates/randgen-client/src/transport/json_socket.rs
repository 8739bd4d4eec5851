//! Persistent WebSocket exchanging JSON requests and envelopes.

use super::{Event, forward_frames};
use crate::{Result, session::SessionId};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use randgen_core::types::GenerationRequest;
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

/// Session id carried by every event of the JSON socket. There is only ever
/// one per page.
pub const JSON_SESSION: SessionId = 0;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct JsonSocket {
    sink: SplitSink<Socket, Message>,
    cancel: CancellationToken,
    reader: JoinHandle<()>,
}

impl JsonSocket {
    /// Connects to `url` and starts forwarding incoming frames to `events`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::WebSocket`] if the handshake fails.
    pub async fn connect(url: &str, events: mpsc::Sender<Event>) -> Result<Self> {
        let (socket, _response) = connect_async(url).await?;
        tracing::debug!("Connected to {url}");

        let (sink, source) = socket.split();
        let cancel = CancellationToken::new();
        let reader = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                forward_frames(source, JSON_SESSION, events, &cancel).await;
            }
        });

        Ok(Self {
            sink,
            cancel,
            reader,
        })
    }

    /// Sends `request` as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Fails if the socket is no longer writable.
    pub async fn send(&mut self, request: &GenerationRequest) -> Result<()> {
        let payload = serde_json::to_string(request)?;
        self.sink.send(Message::Text(payload.into())).await?;
        Ok(())
    }

    /// Sends a close frame and stops the reader without reporting the close.
    pub async fn close(mut self) {
        if let Err(e) = self.sink.close().await {
            tracing::debug!("Failed to close JSON socket: {e}");
        }
        self.cancel.cancel();
        if let Err(e) = self.reader.await {
            tracing::debug!("JSON socket reader failed: {e}");
        }
    }
}
