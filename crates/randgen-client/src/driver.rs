//! The client event loop.
//!
//! [`run`] owns the transports and feeds the [`PageController`] one event at a
//! time: a user submission or a transport event, whichever comes first.
//! Network calls happen in spawned tasks or socket readers and report back
//! through a single [`Event`] channel, so a slow server never blocks the
//! controller.

use crate::{
    ClientError,
    controller::{Dispatch, PageController},
    page::Page,
    session::Session,
    transport::{
        Endpoints, Event, SocketEvent, TransportKind,
        http_post::post_form,
        json_socket::JsonSocket,
        stream_socket::StreamSocket,
    },
};
use randgen_core::validate::FormData;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 64;

struct Transports {
    endpoints: Endpoints,
    events: mpsc::Sender<Event>,
    json: Option<JsonSocket>,
    stream: Session<StreamSocket>,
}

/// Drives `controller` until `submissions` is closed and every outstanding
/// response has been handled, then closes any open socket.
///
/// With [`TransportKind::JsonSocket`] the persistent socket is opened first;
/// if that fails the controller is told the socket closed.
pub async fn run<P: Page>(
    mut controller: PageController<P>,
    endpoints: Endpoints,
    mut submissions: mpsc::Receiver<FormData>,
) -> PageController<P> {
    let (events_tx, mut events) = mpsc::channel(EVENT_BUFFER);
    let mut transports = Transports {
        endpoints,
        events: events_tx,
        json: None,
        stream: Session::new(),
    };

    if controller.transport() == TransportKind::JsonSocket {
        let url = transports.endpoints.generator_url();
        match JsonSocket::connect(&url, transports.events.clone()).await {
            Ok(socket) => transports.json = Some(socket),
            Err(e) => {
                tracing::warn!("Failed to open generator socket: {e}");
                controller.on_close();
            }
        }
    }

    let mut input_open = true;
    while input_open || !controller.is_settled() {
        tokio::select! {
            form = submissions.recv(), if input_open => match form {
                Some(form) => {
                    if let Some(request) = controller.submit(&form) {
                        transports.dispatch(&mut controller, request).await;
                    }
                }
                None => {
                    tracing::debug!("No more submissions");
                    input_open = false;
                }
            },
            Some(event) = events.recv() => transports.deliver(&mut controller, event),
            else => break,
        }
    }

    if let Some(socket) = transports.json.take() {
        socket.close().await;
    }
    transports.stream.close().await;
    controller
}

impl Transports {
    async fn dispatch<P: Page>(&mut self, controller: &mut PageController<P>, request: Dispatch) {
        let sent = match controller.transport() {
            TransportKind::JsonSocket => match self.json.as_mut() {
                Some(socket) => socket.send(&request).await,
                None => Err(ClientError::SocketClosed),
            },
            TransportKind::HttpPost => self.spawn_post(request),
            TransportKind::StreamSocket => self.open_stream(request).await,
        };

        if let Err(e) = sent {
            tracing::debug!("Dispatch failed: {e}");
            controller.on_transport_error();
        }
    }

    fn spawn_post(&self, request: Dispatch) -> crate::Result<()> {
        let uri = self.endpoints.random_uri()?;
        let events = self.events.clone();
        tokio::spawn(async move {
            let response = post_form(&uri, &request).await;
            if events.send(Event::Post(response)).await.is_err() {
                tracing::debug!("Driver stopped before POST completed");
            }
        });
        Ok(())
    }

    async fn open_stream(&mut self, request: Dispatch) -> crate::Result<()> {
        let url = self.endpoints.stream_url(&request)?;
        let events = self.events.clone();
        self.stream
            .replace(|session| StreamSocket::open(url, session, events))
            .await?;
        Ok(())
    }

    fn deliver<P: Page>(&mut self, controller: &mut PageController<P>, event: Event) {
        match event {
            Event::Socket { session, event } => {
                if controller.transport() == TransportKind::StreamSocket {
                    if !self.stream.is_current(session) {
                        tracing::trace!("Dropping event from replaced session {session}");
                        return;
                    }
                    if event == SocketEvent::Closed {
                        self.stream.release(session);
                    }
                }
                match event {
                    SocketEvent::Message(text) => controller.on_message(&text),
                    SocketEvent::Closed => {
                        self.json = None;
                        controller.on_close();
                    }
                }
            }
            Event::Post(Ok(body)) => controller.on_post_response(&body),
            Event::Post(Err(e)) => {
                tracing::debug!("POST failed: {e}");
                controller.on_transport_error();
            }
        }
    }
}
