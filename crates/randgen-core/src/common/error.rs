//! Error types shared by the generator service and its clients.
//!
//! ## Error Cases
//! - `InvalidInput`: Form fields failed client-side validation. Displays the
//!   user-facing message shown by the page.
//! - `InvalidRequest`: A request reached the server but violates its limits.
//! - `ChannelError`: An internal communication failure between tasks.
//! - `ServiceShutdown`: A request arrived while the service was shutting down.

pub type Result<T> = core::result::Result<T, Error>;

/// Message shown to the user when the form fields are rejected.
pub const INPUT_ERROR_MESSAGE: &str = "Ошибка ввода";

/// Unified error type for the generator service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Form input missing, zero, negative or not a number.
    #[error("Ошибка ввода")]
    InvalidInput,

    /// The request was well-formed but exceeded the server's constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Internal channel send/receive failure (e.g., closed or full channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}
