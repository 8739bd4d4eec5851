//! Per-submit WebSocket that streams plain-text chunks.
//!
//! The server sends the numbers and closes the socket itself; the owner only
//! closes it early when a newer submit replaces it.

use super::{Ended, Event, forward_frames};
use crate::{Result, session::{SessionId, SocketHandle}};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::connect_async;
use tokio_util::sync::CancellationToken;

pub struct StreamSocket {
    cancel: CancellationToken,
    reader: JoinHandle<()>,
}

impl StreamSocket {
    /// Opens `url` and forwards its chunks to `events` tagged with `session`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::WebSocket`] if the handshake fails.
    pub async fn open(url: String, session: SessionId, events: mpsc::Sender<Event>) -> Result<Self> {
        let (mut socket, _response) = connect_async(&url).await?;
        tracing::debug!("Session {session}: streaming from {url}");

        let cancel = CancellationToken::new();
        let reader = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if forward_frames(&mut socket, session, events, &cancel).await == Ended::Cancelled {
                    if let Err(e) = socket.close(None).await {
                        tracing::debug!("Session {session}: close failed: {e}");
                    }
                }
            }
        });

        Ok(Self { cancel, reader })
    }
}

impl SocketHandle for StreamSocket {
    async fn close(self) {
        self.cancel.cancel();
        if let Err(e) = self.reader.await {
            tracing::debug!("Stream socket reader failed: {e}");
        }
    }
}
