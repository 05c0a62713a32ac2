//! Cancellable single-shot requests over browser-style transport handles.
//!
//! # Overview
//! Adapts one HTTP request made through a synchronous-callback transport
//! handle (open / set headers / send, then a ready-state or timeout callback)
//! into a cold request that, once subscribed, delivers exactly one value or
//! one error, or nothing at all if it is cancelled first.
//!
//! # Design
//! - `config` merges caller overrides onto defaults.
//! - `acquire` picks the same-domain or cross-domain handle from a
//!   `TransportFactory` and adds default headers.
//! - `lifecycle` drives the handle and owns cancellation. The request's
//!   completion sits in a slot that is taken exactly once, which is what
//!   keeps the timeout callback, the ready-state callback and dispose from
//!   ever emitting twice.
//! - `classify` turns the finished handle into an `Outcome`.
//! - Consumers attach either an `Observer` (`Request::subscribe`) or poll a
//!   `futures::Stream` (`Request::stream`).
//! - Handles are supplied by the embedding environment; `fake` (behind the
//!   `fake` feature) provides a scripted one for tests.

pub mod acquire;
pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod http;
pub mod lifecycle;
pub mod observer;
pub mod stream;
pub mod transport;

pub use client::{Request, XhrClient};
pub use config::{ConfigOverrides, RequestConfig};
pub use context::{RequestContext, ResponseTransform};
pub use error::{ErrorKind, Outcome, RequestError, TransformError, TransportError};
pub use http::{HttpMethod, RawResponse, ReadyState, ResponseType};
pub use lifecycle::Subscription;
pub use observer::Observer;
pub use stream::ResponseStream;
pub use transport::{
    Credentials, Listener, ResponseSnapshot, ResponseView, Transport, TransportFactory,
    TransportHandle, TransportKind,
};
