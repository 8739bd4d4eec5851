//! Errors raised while talking to the generator service.
//!
//! None of these reach the user directly: the controller treats transport
//! and decode failures as silently dropped responses. They exist so the
//! driver can log what went wrong.

pub type Result<T> = core::result::Result<T, ClientError>;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// The configured base URL cannot be turned into service endpoints.
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// WebSocket handshake or frame failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// HTTP exchange failure.
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Building an HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(#[from] hyper::http::Error),

    /// Connecting the underlying TCP stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a request as form data or query string failed.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// Encoding a request as JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The socket this operation needs is not open.
    #[error("Socket is closed")]
    SocketClosed,
}

impl ClientError {
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
