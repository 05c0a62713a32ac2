//! Error types for the request adapter.
//!
//! # Design
//! `TransportError` is what a transport handle or factory reports when one of
//! its operations fails. `RequestError` is what the stream consumer sees: one
//! variant per failure kind, each carrying either the underlying transport
//! error or a message synthesized from the response body or status text.
//! `ErrorKind` is the flat tag for callers that only need to branch.

use thiserror::Error;

/// Error raised by a response transform.
pub type TransformError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a request finally produces: one value or one error.
pub type Outcome<T> = Result<T, RequestError>;

/// Errors reported by transport handles and factories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The factory could not produce a handle of the requested variant.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// An operation was attempted in a ready state that does not allow it.
    #[error("invalid transport state for {operation}: {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// The handle refused the requested response type.
    #[error("response type {0} is not supported")]
    UnsupportedResponseType(String),

    /// A header name or value the handle cannot send.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The connection could not be established or was lost.
    #[error("network error: {0}")]
    Network(String),
}

/// Flat classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TransportCreation,
    RequestSetup,
    Timeout,
    Auth,
    Gone,
    TimeoutStatus,
    Http,
    InvalidPayload,
}

/// Terminal failure delivered to the stream consumer.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The transport factory could not create a handle.
    #[error("failed to create transport: {0}")]
    TransportCreation(#[source] TransportError),

    /// Opening, configuring or sending the request failed.
    #[error("request setup failed: {0}")]
    RequestSetup(#[source] TransportError),

    /// The handle's own timeout fired before the request completed.
    #[error("{message}")]
    Timeout { message: String },

    /// 401, 403 or 407.
    #[error("{message}")]
    Auth { status: u16, message: String },

    /// 410. Left to the caller to retry.
    #[error("{message}")]
    Gone { message: String },

    /// 408 or 504. Left to the caller to retry.
    #[error("{message}")]
    TimeoutStatus { status: u16, message: String },

    /// Any other status outside 200-399.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The response transform rejected a successful response body.
    #[error("invalid payload: {source}")]
    InvalidPayload {
        #[source]
        source: TransformError,
    },
}

impl RequestError {
    pub(crate) fn timeout() -> Self {
        RequestError::Timeout {
            message: "timeout error".to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::TransportCreation(_) => ErrorKind::TransportCreation,
            RequestError::RequestSetup(_) => ErrorKind::RequestSetup,
            RequestError::Timeout { .. } => ErrorKind::Timeout,
            RequestError::Auth { .. } => ErrorKind::Auth,
            RequestError::Gone { .. } => ErrorKind::Gone,
            RequestError::TimeoutStatus { .. } => ErrorKind::TimeoutStatus,
            RequestError::Http { .. } => ErrorKind::Http,
            RequestError::InvalidPayload { .. } => ErrorKind::InvalidPayload,
        }
    }

    /// The normalized HTTP status behind a status-derived failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Auth { status, .. }
            | RequestError::TimeoutStatus { status, .. }
            | RequestError::Http { status, .. } => Some(*status),
            RequestError::Gone { .. } => Some(410),
            _ => None,
        }
    }

    /// 408, 410 and 504 are worth retrying. Nothing here retries them.
    pub fn is_retry_candidate(&self) -> bool {
        matches!(
            self,
            RequestError::Gone { .. } | RequestError::TimeoutStatus { .. }
        )
    }
}
