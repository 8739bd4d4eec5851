//! The page controller: validation, dispatch and rendering of responses.
//!
//! [`PageController`] is a synchronous state machine. It never touches the
//! network itself; the driver feeds it user submissions and transport events
//! one at a time and performs the dispatch it asks for.
//!
//! ```text
//!            submit (json/post)            response, pending == 0
//!   Idle ─────────────────────► AwaitingResponse ─────────────────► Idle
//!    │  submit (stream)                                  ▲
//!    └──────────────────────► Streaming ── close ────────┘
//!
//!   any ── JSON socket close ──► Closed
//! ```

use crate::{page::Page, transport::TransportKind};
use randgen_core::{
    types::{Envelope, GenerationRequest, GenerationResult, NUMBER_SEPARATOR},
    validate::{FormData, validate_form},
};

/// The validated request a submit asks the transport to send.
pub type Dispatch = GenerationRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Ready for a submit, nothing outstanding.
    Idle,
    /// At least one JSON or POST response is outstanding.
    AwaitingResponse,
    /// Chunks of the current stream are arriving.
    Streaming,
    /// The persistent JSON socket is gone. Terminal.
    Closed,
}

#[derive(Debug)]
pub struct PageController<P> {
    page: P,
    transport: TransportKind,
    state: State,
    pending: usize,
    chunks: usize,
}

impl<P: Page> PageController<P> {
    pub fn new(page: P, transport: TransportKind) -> Self {
        Self {
            page,
            transport,
            state: State::Idle,
            pending: 0,
            chunks: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// True when nothing is outstanding.
    pub fn is_settled(&self) -> bool {
        matches!(self.state, State::Idle | State::Closed)
    }

    /// Validates `form` and returns the request to dispatch.
    ///
    /// Invalid input raises the input-error alert and returns `None`; nothing
    /// must be sent in that case.
    pub fn submit(&mut self, form: &FormData) -> Option<Dispatch> {
        let request = match validate_form(form) {
            Ok(request) => request,
            Err(e) => {
                self.page.alert(&e.to_string());
                return None;
            }
        };

        match self.transport {
            TransportKind::JsonSocket if self.state == State::Closed => {
                tracing::warn!("Generator socket is closed, dropping submit");
                return None;
            }
            TransportKind::JsonSocket => {
                self.pending += 1;
                self.state = State::AwaitingResponse;
                self.page.set_controls_enabled(false);
            }
            TransportKind::HttpPost => {
                self.pending += 1;
                self.state = State::AwaitingResponse;
            }
            TransportKind::StreamSocket => {
                self.page.set_output("");
                self.chunks = 0;
                self.state = State::Streaming;
            }
        }

        tracing::debug!(?request, transport = ?self.transport, "Dispatching");
        Some(request)
    }

    /// Handles a text frame from the socket in use.
    pub fn on_message(&mut self, text: &str) {
        match (self.transport, self.state) {
            (TransportKind::JsonSocket, State::AwaitingResponse) => {
                self.render_envelope(text);
                self.settle_one();
            }
            (TransportKind::StreamSocket, State::Streaming) => {
                if self.chunks > 0 {
                    self.page.append_output(NUMBER_SEPARATOR);
                }
                self.page.append_output(text);
                self.chunks += 1;
            }
            (transport, state) => {
                tracing::debug!(?transport, ?state, "Ignoring unexpected message");
            }
        }
    }

    /// Handles the body of a `POST /random` response.
    pub fn on_post_response(&mut self, body: &[u8]) {
        if self.transport != TransportKind::HttpPost {
            return;
        }
        match serde_json::from_slice::<GenerationResult>(body) {
            Ok(result) => self.page.set_output(&result.render()),
            Err(e) => tracing::debug!("Ignoring malformed POST response: {e}"),
        }
        self.settle_one();
    }

    /// A dispatch failed before any response could arrive.
    pub fn on_transport_error(&mut self) {
        match (self.transport, self.state) {
            (TransportKind::StreamSocket, State::Streaming) => self.state = State::Idle,
            (TransportKind::StreamSocket, _) => {}
            _ => self.settle_one(),
        }
    }

    /// The socket in use closed.
    ///
    /// For the JSON socket this also re-enables the controls a pending
    /// submit disabled, since its response will never arrive.
    pub fn on_close(&mut self) {
        match self.transport {
            TransportKind::JsonSocket => {
                tracing::info!("Generator socket closed");
                self.state = State::Closed;
                self.pending = 0;
                self.page.set_controls_enabled(true);
            }
            TransportKind::StreamSocket if self.state == State::Streaming => {
                tracing::debug!(chunks = self.chunks, "Stream complete");
                self.state = State::Idle;
                self.page.output_complete();
            }
            _ => {}
        }
    }

    fn render_envelope(&mut self, text: &str) {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!("Ignoring malformed envelope: {e}");
                return;
            }
        };

        if envelope.ok {
            if let Some(result) = envelope.result {
                self.page.set_output(&result.render());
            }
        } else if let Some(error) = envelope.error {
            self.page.alert(&error);
        }
    }

    fn settle_one(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 && self.state == State::AwaitingResponse {
            self.state = State::Idle;
            if self.transport == TransportKind::JsonSocket {
                self.page.set_controls_enabled(true);
            }
        }
    }
}
