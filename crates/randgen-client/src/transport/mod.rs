//! Transport strategies for reaching the generator service.
//!
//! Three interchangeable strategies exist; a page uses exactly one of them,
//! chosen up front through [`TransportKind`]:
//!
//! - [`json_socket`] - one long-lived WebSocket, JSON request and envelope
//!   per submit.
//! - [`http_post`] - one form-encoded `POST /random` per submit, JSON array
//!   response.
//! - [`stream_socket`] - a fresh WebSocket per submit with the counts in the
//!   query string, streaming plain-text chunks until the server closes it.
//!
//! Socket readers and POST tasks report back to the driver through [`Event`]s
//! on a single channel, so the controller only ever sees one event at a time.

pub mod http_post;
pub mod json_socket;
pub mod stream_socket;

use crate::{ClientError, Result, session::SessionId};
use futures::{Stream, StreamExt};
use hyper::{Uri, body::Bytes};
use randgen_core::types::GenerationRequest;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

/// Which strategy a page talks to the service with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportKind {
    /// Persistent WebSocket exchanging JSON requests and envelopes.
    JsonSocket,
    /// Form-encoded HTTP POST answered with a JSON array.
    HttpPost,
    /// Per-submit WebSocket streaming plain-text chunks.
    StreamSocket,
}

/// Something that happened on a socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketEvent {
    /// A text frame arrived.
    Message(String),
    /// The socket closed or failed; no further events follow.
    Closed,
}

/// Asynchronous results delivered to the driver.
#[derive(Debug)]
pub enum Event {
    Socket {
        session: SessionId,
        event: SocketEvent,
    },
    Post(Result<Bytes>),
}

/// Service URLs derived from a base URL such as `http://127.0.0.1:8080`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    authority: String,
    prefix: String,
}

impl Endpoints {
    /// Accepts `http://` and `ws://` base URLs, with an optional path prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] for unparseable URLs, URLs without
    /// a host, and TLS schemes (`https`, `wss`), which are not supported.
    pub fn new(base_url: &str) -> Result<Self> {
        let uri: Uri = base_url
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| ClientError::invalid_url(base_url, e.to_string()))?;

        match uri.scheme_str() {
            Some("http" | "ws") => {}
            Some("https" | "wss") => {
                return Err(ClientError::invalid_url(base_url, "TLS is not supported"));
            }
            _ => return Err(ClientError::invalid_url(base_url, "expected http:// or ws://")),
        }

        let authority = uri
            .authority()
            .ok_or_else(|| ClientError::invalid_url(base_url, "missing host"))?
            .to_string();
        let prefix = uri.path().trim_end_matches('/').to_owned();

        Ok(Self { authority, prefix })
    }

    /// `ws://host/generator`, the JSON socket.
    pub fn generator_url(&self) -> String {
        format!("ws://{}{}/generator", self.authority, self.prefix)
    }

    /// `ws://host/generator?countNumbers=..&countThreads=..`, the streaming
    /// socket for `request`.
    pub fn stream_url(&self, request: &GenerationRequest) -> Result<String> {
        let query = serde_urlencoded::to_string(request)?;
        Ok(format!("{}?{query}", self.generator_url()))
    }

    /// `http://host/random`, the POST endpoint.
    pub fn random_uri(&self) -> Result<Uri> {
        let url = format!("http://{}{}/random", self.authority, self.prefix);
        url.parse()
            .map_err(|e: hyper::http::uri::InvalidUri| ClientError::invalid_url(url, e.to_string()))
    }
}

/// How [`forward_frames`] stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Ended {
    /// The socket closed, failed, or the driver stopped listening.
    Closed,
    /// `cancel` fired; the caller still owns an open socket.
    Cancelled,
}

/// Reads frames from `source` and forwards them as [`Event::Socket`]s.
///
/// Text frames become [`SocketEvent::Message`]; control frames and binary
/// frames are skipped. A close frame, a read error or the end of the stream
/// produce a single [`SocketEvent::Closed`]. Nothing is reported when
/// `cancel` fires, even while waiting for room in `events`.
pub(crate) async fn forward_frames<S>(
    mut source: S,
    session: SessionId,
    events: mpsc::Sender<Event>,
    cancel: &CancellationToken,
) -> Ended
where
    S: Stream<Item = core::result::Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ended::Cancelled,
            frame = source.next() => frame,
        };

        let event = match frame {
            Some(Ok(Message::Text(text))) => SocketEvent::Message(text.as_str().to_owned()),
            Some(Ok(Message::Binary(_))) => {
                tracing::debug!("Session {session}: ignoring binary frame");
                continue;
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Close(_))) | None => SocketEvent::Closed,
            Some(Err(e)) => {
                tracing::debug!("Session {session}: socket error: {e}");
                SocketEvent::Closed
            }
        };

        // The driver may be closing this socket while the channel is full.
        let closed = event == SocketEvent::Closed;
        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ended::Cancelled,
            sent = events.send(Event::Socket { session, event }) => sent,
        };
        if sent.is_err() || closed {
            return Ended::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest::new(5, 2).unwrap()
    }

    #[test]
    fn endpoints_follow_the_base_url() {
        let endpoints = Endpoints::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(endpoints.generator_url(), "ws://127.0.0.1:8080/generator");
        assert_eq!(
            endpoints.stream_url(&request()).unwrap(),
            "ws://127.0.0.1:8080/generator?countNumbers=5&countThreads=2"
        );
        assert_eq!(
            endpoints.random_uri().unwrap().to_string(),
            "http://127.0.0.1:8080/random"
        );
    }

    #[test]
    fn endpoints_keep_a_path_prefix() {
        let endpoints = Endpoints::new("ws://example.com/demo/").unwrap();
        assert_eq!(endpoints.generator_url(), "ws://example.com/demo/generator");
        assert_eq!(
            endpoints.random_uri().unwrap().to_string(),
            "http://example.com/demo/random"
        );
    }

    #[test]
    fn endpoints_reject_unsupported_urls() {
        for url in ["https://example.com", "wss://example.com", "ftp://x", "/relative", "::"] {
            assert!(
                matches!(Endpoints::new(url), Err(ClientError::InvalidUrl { .. })),
                "{url}"
            );
        }
    }

    #[tokio::test]
    async fn forward_frames_reports_text_and_close() {
        let frames = futures::stream::iter(vec![
            Ok(Message::Text("1 2".into())),
            Ok(Message::Ping(Bytes::new())),
            Ok(Message::Binary(Bytes::from_static(b"\x00"))),
            Ok(Message::Text("3".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("late".into())),
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let ended = forward_frames(frames, 7, tx, &cancel).await;
        assert_eq!(ended, Ended::Closed);

        let mut seen = Vec::new();
        while let Some(Event::Socket { session, event }) = rx.recv().await {
            assert_eq!(session, 7);
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                SocketEvent::Message("1 2".into()),
                SocketEvent::Message("3".into()),
                SocketEvent::Closed,
            ]
        );
    }

    #[tokio::test]
    async fn forward_frames_stops_when_cancelled_on_a_full_channel() {
        let frames = futures::stream::iter((0..100).map(|n| Ok(Message::Text(n.to_string().into()))));
        let (tx, mut rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let reader = tokio::spawn({
            let cancel = cancel.clone();
            async move { forward_frames(frames, 3, tx, &cancel).await }
        });

        // Nobody drains the channel; the reader parks on the third frame.
        while rx.len() < 2 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        assert_eq!(reader.await.unwrap(), Ended::Cancelled);
        let mut delivered = 0;
        while rx.recv().await.is_some() {
            delivered += 1;
        }
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn forward_frames_stops_silently_when_cancelled() {
        let frames = futures::stream::pending();
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(forward_frames(frames, 1, tx, &cancel).await, Ended::Cancelled);
        assert!(rx.recv().await.is_none());
    }
}
