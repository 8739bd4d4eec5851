//! HTTP and WebSocket surface of the generator service.
//!
//! ## Structure
//!
//! - [`handler`] - shared service state and route handlers.
//! - [`lifecycle`] - in-flight accounting and graceful shutdown.
//! - [`routes`] - router assembly, static files and CORS.
//! - [`streaming`] - framing of streamed results into text messages.

pub mod handler;
pub mod lifecycle;
pub mod routes;
pub mod streaming;
