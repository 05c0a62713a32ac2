//! The transport capability the adapter drives.
//!
//! # Design
//! A transport handle is a browser-style connection object: it is opened,
//! configured, sent, and later reports completion through callbacks bound on
//! it. Handles are created by a `TransportFactory` in one of two variants,
//! same-domain or cross-domain, and the adapter holds whichever it got as a
//! `Transport<S, C>` so both variants sit behind one `TransportHandle` impl.
//!
//! Callbacks receive the handle's state as a `&dyn ResponseView` argument
//! instead of reaching back into the handle, so a handle may fire them from
//! inside `send`/`abort` or from another thread without re-entrant borrows.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, RawResponse, ReadyState, ResponseType};

/// Read-only view of a handle's response state.
pub trait ResponseView {
    fn ready_state(&self) -> ReadyState;
    fn status(&self) -> u16;
    fn status_text(&self) -> &str;
    /// The structured body, when the transport supports one.
    fn response(&self) -> Option<RawResponse>;
    fn response_text(&self) -> String;
}

/// Callback bound to a handle lifecycle event.
pub type Listener = Box<dyn FnMut(&dyn ResponseView) + Send>;

/// User and optional password passed to `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub user: &'a str,
    pub password: Option<&'a str>,
}

/// One in-flight HTTP connection.
pub trait TransportHandle: Send + 'static {
    fn open(
        &mut self,
        method: HttpMethod,
        url: &str,
        asynchronous: bool,
        credentials: Option<Credentials<'_>>,
    ) -> Result<(), TransportError>;

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError>;

    fn set_with_credentials(&mut self, with_credentials: bool) -> Result<(), TransportError>;

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    /// Handles that cannot produce `response_type` return
    /// [`TransportError::UnsupportedResponseType`].
    fn set_response_type(&mut self, response_type: ResponseType) -> Result<(), TransportError>;

    /// Replace the "ready-state changed" callback.
    fn on_ready_state_change(&mut self, listener: Listener);

    /// Replace the "timed out" callback.
    fn on_timeout(&mut self, listener: Listener);

    fn send(&mut self, body: Option<&str>) -> Result<(), TransportError>;

    fn abort(&mut self);

    fn ready_state(&self) -> ReadyState;
}

/// Which handle variant a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    SameDomain,
    CrossDomain,
}

impl TransportKind {
    pub fn for_cross_domain(cross_domain: bool) -> Self {
        if cross_domain {
            TransportKind::CrossDomain
        } else {
            TransportKind::SameDomain
        }
    }
}

/// Creates transport handles. Supplied by the embedding environment.
pub trait TransportFactory: Send + Sync + 'static {
    type SameDomain: TransportHandle;
    type CrossDomain: TransportHandle;

    fn same_domain(&self) -> Result<Self::SameDomain, TransportError>;

    fn cross_domain(&self) -> Result<Self::CrossDomain, TransportError>;
}

/// A handle of either variant.
#[derive(Debug)]
pub enum Transport<S, C> {
    SameDomain(S),
    CrossDomain(C),
}

impl<S, C> Transport<S, C> {
    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::SameDomain(_) => TransportKind::SameDomain,
            Transport::CrossDomain(_) => TransportKind::CrossDomain,
        }
    }
}

impl<S: TransportHandle, C: TransportHandle> TransportHandle for Transport<S, C> {
    fn open(
        &mut self,
        method: HttpMethod,
        url: &str,
        asynchronous: bool,
        credentials: Option<Credentials<'_>>,
    ) -> Result<(), TransportError> {
        match self {
            Transport::SameDomain(t) => t.open(method, url, asynchronous, credentials),
            Transport::CrossDomain(t) => t.open(method, url, asynchronous, credentials),
        }
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError> {
        match self {
            Transport::SameDomain(t) => t.set_timeout(timeout),
            Transport::CrossDomain(t) => t.set_timeout(timeout),
        }
    }

    fn set_with_credentials(&mut self, with_credentials: bool) -> Result<(), TransportError> {
        match self {
            Transport::SameDomain(t) => t.set_with_credentials(with_credentials),
            Transport::CrossDomain(t) => t.set_with_credentials(with_credentials),
        }
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        match self {
            Transport::SameDomain(t) => t.set_request_header(name, value),
            Transport::CrossDomain(t) => t.set_request_header(name, value),
        }
    }

    fn set_response_type(&mut self, response_type: ResponseType) -> Result<(), TransportError> {
        match self {
            Transport::SameDomain(t) => t.set_response_type(response_type),
            Transport::CrossDomain(t) => t.set_response_type(response_type),
        }
    }

    fn on_ready_state_change(&mut self, listener: Listener) {
        match self {
            Transport::SameDomain(t) => t.on_ready_state_change(listener),
            Transport::CrossDomain(t) => t.on_ready_state_change(listener),
        }
    }

    fn on_timeout(&mut self, listener: Listener) {
        match self {
            Transport::SameDomain(t) => t.on_timeout(listener),
            Transport::CrossDomain(t) => t.on_timeout(listener),
        }
    }

    fn send(&mut self, body: Option<&str>) -> Result<(), TransportError> {
        match self {
            Transport::SameDomain(t) => t.send(body),
            Transport::CrossDomain(t) => t.send(body),
        }
    }

    fn abort(&mut self) {
        match self {
            Transport::SameDomain(t) => t.abort(),
            Transport::CrossDomain(t) => t.abort(),
        }
    }

    fn ready_state(&self) -> ReadyState {
        match self {
            Transport::SameDomain(t) => t.ready_state(),
            Transport::CrossDomain(t) => t.ready_state(),
        }
    }
}

/// Owned copy of a handle's response state.
///
/// Transports that finish on a worker thread can build one of these and pass
/// it to their listeners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSnapshot {
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    pub response: Option<RawResponse>,
    pub response_text: String,
}

impl ResponseSnapshot {
    /// A completed response whose body is available as both text and
    /// structured response.
    pub fn completed(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            ready_state: ReadyState::Done,
            status,
            status_text: String::new(),
            response: Some(RawResponse::Text(body.clone())),
            response_text: body,
        }
    }
}

impl ResponseView for ResponseSnapshot {
    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn status_text(&self) -> &str {
        &self.status_text
    }

    fn response(&self) -> Option<RawResponse> {
        self.response.clone()
    }

    fn response_text(&self) -> String {
        self.response_text.clone()
    }
}
