//! Request handlers for the generator service.
//!
//! This module defines [`GeneratorService`], the shared state behind every
//! route, and the axum handlers for the three ways a client can ask for
//! numbers:
//!
//! - `POST /random` answers a form submission with a bare JSON array.
//! - `GET /generator` without query parameters upgrades to a WebSocket that
//!   answers each JSON request frame with an [`Envelope`].
//! - `GET /generator?countNumbers=..&countThreads=..` upgrades to a WebSocket
//!   that streams the numbers as plain-text frames and then closes.
//!
//! ## Responsibilities
//!
//! - Validate incoming counts and enforce the configured limits.
//! - Spawn generations through [`spawn_unique`] under an in-flight guard.
//! - Report failures in the shape each transport expects.

use crate::server::{
    config::ServerConfig,
    generation::{
        collect_unique,
        source::{RandSource, ThreadRandom},
        spawn_unique,
    },
    service::{
        lifecycle::{InflightGuard, Lifecycle},
        streaming::feed_messages,
    },
};
use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::FormRejection,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use core::time::Duration;
use randgen_core::{
    Error,
    types::{
        COUNT_NUMBERS_FIELD, COUNT_THREADS_FIELD, Envelope, GenerationRequest, GenerationResult,
    },
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared state of the generator service.
///
/// Cheap to clone: configuration and lifecycle are reference counted and the
/// random source is expected to be a handle.
#[derive(Clone, Debug)]
pub struct GeneratorService<R = ThreadRandom> {
    config: Arc<ServerConfig>,
    lifecycle: Arc<Lifecycle>,
    rand: R,
}

/// A running generation and the guard that keeps it counted as in flight.
pub struct Generation {
    pub numbers: mpsc::Receiver<u32>,
    pub guard: InflightGuard,
}

impl GeneratorService<ThreadRandom> {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_rand(config, ThreadRandom)
    }
}

impl<R: RandSource> GeneratorService<R> {
    pub fn with_rand(config: ServerConfig, rand: R) -> Self {
        let lifecycle = Lifecycle::new(Duration::from_secs(config.shutdown_timeout));
        Self {
            config: Arc::new(config),
            lifecycle: Arc::new(lifecycle),
            rand,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Drains in-flight generations and cancels the rest.
    pub async fn shutdown(&self) {
        self.lifecycle.shutdown().await;
    }

    /// Checks limits and spawns a generation for `request`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if the counts exceed the configured limits.
    /// - [`Error::ServiceShutdown`] once shutdown has started.
    pub fn start(&self, request: GenerationRequest) -> Result<Generation, Error> {
        request.check_limits(self.config.max_count_numbers, self.config.max_count_threads)?;
        let guard = self.lifecycle.begin()?;
        let numbers = spawn_unique(
            request,
            self.rand.clone(),
            self.lifecycle.token(),
            self.config.stream_buffer_size,
        );
        Ok(Generation { numbers, guard })
    }

    /// Runs a generation to completion.
    ///
    /// # Errors
    ///
    /// Everything [`GeneratorService::start`] returns, plus
    /// [`Error::ServiceShutdown`] if the generation was cancelled midway.
    pub async fn generate(&self, request: GenerationRequest) -> Result<Vec<u32>, Error> {
        let Generation { numbers, guard } = self.start(request)?;
        let numbers = collect_unique(numbers).await;
        drop(guard);

        if numbers.len() != request.count_numbers as usize {
            if self.lifecycle.token().is_cancelled() {
                return Err(Error::ServiceShutdown);
            }
            return Err(Error::ChannelError {
                context: format!(
                    "generation ended after {} of {} numbers",
                    numbers.len(),
                    request.count_numbers
                ),
            });
        }
        Ok(numbers)
    }

    /// Answers one JSON request frame.
    pub async fn answer(&self, raw: &str) -> Envelope {
        let request: GenerationRequest = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(e) => return Envelope::failure(format!("Invalid request: {e}")),
        };

        match self.generate(request).await {
            Ok(numbers) => Envelope::success(numbers.into()),
            Err(e) => {
                tracing::warn!("Rejected socket request: {e}");
                Envelope::failure(e.to_string())
            }
        }
    }
}

/// Raw count fields as they arrive in a form body or query string.
///
/// Kept as strings so missing and malformed values can be told apart from
/// an absent query (which selects the JSON socket mode).
#[derive(Debug, Default, Deserialize)]
pub struct RawCounts {
    #[serde(rename = "countNumbers")]
    pub count_numbers: Option<String>,
    #[serde(rename = "countThreads")]
    pub count_threads: Option<String>,
}

impl RawCounts {
    pub fn is_empty(&self) -> bool {
        self.count_numbers.is_none() && self.count_threads.is_none()
    }

    /// Strict decimal parsing: unlike the client validator, trailing garbage
    /// is rejected.
    pub fn parse(&self) -> Result<GenerationRequest, Error> {
        Ok(GenerationRequest {
            count_numbers: parse_field(self.count_numbers.as_deref(), COUNT_NUMBERS_FIELD)?,
            count_threads: parse_field(self.count_threads.as_deref(), COUNT_THREADS_FIELD)?,
        })
    }
}

fn parse_field(raw: Option<&str>, field: &str) -> Result<u32, Error> {
    let raw = raw.ok_or_else(|| Error::invalid_request(format!("{field} is required")))?;
    raw.parse()
        .map_err(|e| Error::invalid_request(format!("{field} {raw:?}: {e}")))
}

/// `POST /random`: form-encoded counts in, JSON array out.
///
/// Invalid input is logged and answered with an empty array rather than an
/// error status.
#[tracing::instrument(skip_all)]
pub async fn random<R: RandSource>(
    State(service): State<GeneratorService<R>>,
    form: Result<Form<RawCounts>, FormRejection>,
) -> Json<GenerationResult> {
    let request = form
        .map_err(|e| Error::invalid_request(e.body_text()))
        .and_then(|Form(raw)| raw.parse());

    let numbers = match request {
        Ok(request) => service.generate(request).await,
        Err(e) => Err(e),
    };

    match numbers {
        Ok(numbers) => {
            tracing::info!(count = numbers.len(), "Generated numbers");
            Json(numbers.into())
        }
        Err(e) => {
            tracing::warn!("Rejected /random request: {e}");
            Json(GenerationResult::default())
        }
    }
}

/// `GET /generator`: WebSocket upgrade, JSON or streaming depending on
/// whether counts are present in the query string.
pub async fn generator<R: RandSource>(
    State(service): State<GeneratorService<R>>,
    Query(raw): Query<RawCounts>,
    ws: WebSocketUpgrade,
) -> Response {
    if raw.is_empty() {
        ws.on_upgrade(move |socket| json_session(socket, service))
    } else {
        let request = raw.parse();
        ws.on_upgrade(move |socket| stream_session(socket, service, request))
    }
}

async fn json_session<R: RandSource>(mut socket: WebSocket, service: GeneratorService<R>) {
    tracing::debug!("JSON socket opened");

    while let Some(message) = socket.recv().await {
        let envelope = match message {
            Ok(Message::Text(text)) => service.answer(text.as_str()).await,
            Ok(Message::Binary(_)) => Envelope::failure("binary messages are not supported"),
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) | Err(_) => break,
        };

        let Ok(payload) = serde_json::to_string(&envelope) else {
            break;
        };
        if socket.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }

    tracing::debug!("JSON socket closed");
}

#[tracing::instrument(skip(socket, service))]
async fn stream_session<R: RandSource>(
    mut socket: WebSocket,
    service: GeneratorService<R>,
    request: Result<GenerationRequest, Error>,
) {
    let Generation { numbers, guard } = match request.and_then(|r| service.start(r)) {
        Ok(generation) => generation,
        Err(e) => {
            tracing::warn!("Rejected streaming request: {e}");
            close(&mut socket, close_code::POLICY, e.to_string()).await;
            return;
        }
    };

    match feed_messages(numbers, &mut socket, service.config().numbers_per_message).await {
        Ok(sent) => {
            tracing::debug!("Streamed {sent} numbers");
            if service.lifecycle.token().is_cancelled() {
                close(&mut socket, close_code::AWAY, Error::ServiceShutdown.to_string()).await;
            } else {
                close(&mut socket, close_code::NORMAL, String::new()).await;
            }
        }
        Err(e) => tracing::debug!("Client went away mid-stream: {e}"),
    }

    drop(guard);
}

/// Largest close reason a WebSocket control frame can carry, in bytes.
pub const MAX_CLOSE_REASON_BYTES: usize = 123;

/// Cuts `reason` to [`MAX_CLOSE_REASON_BYTES`] on a char boundary.
fn close_reason(mut reason: String) -> String {
    if reason.len() > MAX_CLOSE_REASON_BYTES {
        let mut end = MAX_CLOSE_REASON_BYTES;
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        reason.truncate(end);
    }
    reason
}

async fn close(socket: &mut WebSocket, code: u16, reason: String) {
    let frame = CloseFrame {
        code,
        reason: close_reason(reason).into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("Failed to send close frame: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_reason_fits_a_control_frame() {
        assert_eq!(close_reason("short".into()), "short");

        let long = close_reason("x".repeat(500));
        assert_eq!(long.len(), MAX_CLOSE_REASON_BYTES);

        // Two-byte chars: 61 of them take 122 bytes, the 62nd would overflow.
        let cyrillic = close_reason("ж".repeat(100));
        assert_eq!(cyrillic.len(), 122);
        assert!(cyrillic.chars().all(|c| c == 'ж'));
    }
}
