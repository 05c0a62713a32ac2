//! Scripted in-memory transport and a recording observer.
//!
//! # Design
//! `FakeTransport` is a cheaply clonable handle over shared state: the
//! adapter owns one clone, the test keeps another to inspect what the
//! adapter did (open arguments, headers present at `send`, abort count) and
//! to drive the handle's events (`respond`, `progress`, `fire_timeout`).
//! Listeners are always called with the internal lock released, so they can
//! be fired from inside `send` and `abort` the way browser transports do.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{ErrorKind, RequestError, TransportError};
use crate::http::{HttpMethod, ReadyState, ResponseType};
use crate::observer::Observer;
use crate::transport::{
    Credentials, Listener, ResponseSnapshot, ResponseView, TransportFactory, TransportHandle,
    TransportKind,
};

/// Arguments the adapter passed to `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCall {
    pub method: HttpMethod,
    pub url: String,
    pub asynchronous: bool,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Operation a `FakeTransport` can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Open,
    SetRequestHeader,
    Send,
}

#[derive(Clone, Copy)]
enum Event {
    ReadyStateChange,
    Timeout,
}

#[derive(Default)]
struct FakeState {
    response: ResponseSnapshot,
    opened: Option<OpenCall>,
    timeout: Option<Duration>,
    with_credentials: Option<bool>,
    response_type: Option<ResponseType>,
    headers: BTreeMap<String, String>,
    headers_at_send: Option<BTreeMap<String, String>>,
    sent_body: Option<Option<String>>,
    send_count: usize,
    abort_count: usize,
    rejected_response_types: Vec<ResponseType>,
    failure: Option<(FailPoint, TransportError)>,
    reply_on_send: Option<ResponseSnapshot>,
    on_ready_state_change: Option<Listener>,
    on_timeout: Option<Listener>,
}

impl FakeState {
    fn listener(&mut self, event: Event) -> &mut Option<Listener> {
        match event {
            Event::ReadyStateChange => &mut self.on_ready_state_change,
            Event::Timeout => &mut self.on_timeout,
        }
    }

    fn check(&self, point: FailPoint) -> Result<(), TransportError> {
        match &self.failure {
            Some((at, err)) if *at == point => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn require_opened(&self, operation: &'static str) -> Result<(), TransportError> {
        if self.response.ready_state == ReadyState::Opened {
            Ok(())
        } else {
            Err(TransportError::InvalidState {
                operation,
                state: format!("{:?}", self.response.ready_state),
            })
        }
    }
}

/// In-memory transport handle driven by the test.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse `response_type` in `set_response_type`.
    pub fn reject_response_type(self, response_type: ResponseType) -> Self {
        self.lock().rejected_response_types.push(response_type);
        self
    }

    pub fn fail_at(self, point: FailPoint, error: TransportError) -> Self {
        self.lock().failure = Some((point, error));
        self
    }

    /// Complete synchronously from inside `send`.
    pub fn reply_on_send(self, status: u16, body: &str) -> Self {
        self.lock().reply_on_send = Some(ResponseSnapshot::completed(status, body));
        self
    }

    /// Finish with `status` and a text body.
    pub fn respond(&self, status: u16, body: &str) {
        self.complete(ResponseSnapshot::completed(status, body));
    }

    /// Finish with an arbitrary terminal snapshot.
    pub fn complete(&self, snapshot: ResponseSnapshot) {
        self.lock().response = snapshot.clone();
        self.fire(Event::ReadyStateChange, &snapshot);
    }

    /// Report a non-terminal ready state.
    pub fn progress(&self, ready_state: ReadyState) {
        let snapshot = {
            let mut state = self.lock();
            state.response.ready_state = ready_state;
            state.response.clone()
        };
        self.fire(Event::ReadyStateChange, &snapshot);
    }

    /// Time out the way browser transports do: the timeout event, followed
    /// by a terminal ready-state change with status 0.
    pub fn fire_timeout(&self) {
        let snapshot = self.finish_without_response();
        self.fire(Event::Timeout, &snapshot);
        self.fire(Event::ReadyStateChange, &snapshot);
    }

    pub fn opened(&self) -> Option<OpenCall> {
        self.lock().opened.clone()
    }

    /// Headers as they were when `send` ran.
    pub fn headers_at_send(&self) -> Option<BTreeMap<String, String>> {
        self.lock().headers_at_send.clone()
    }

    /// `Some(body)` once `send` ran.
    pub fn sent_body(&self) -> Option<Option<String>> {
        self.lock().sent_body.clone()
    }

    pub fn send_count(&self) -> usize {
        self.lock().send_count
    }

    pub fn abort_count(&self) -> usize {
        self.lock().abort_count
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.lock().timeout
    }

    pub fn with_credentials(&self) -> Option<bool> {
        self.lock().with_credentials
    }

    pub fn response_type(&self) -> Option<ResponseType> {
        self.lock().response_type
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_without_response(&self) -> ResponseSnapshot {
        let mut state = self.lock();
        state.response = ResponseSnapshot {
            ready_state: ReadyState::Done,
            ..ResponseSnapshot::default()
        };
        state.response.clone()
    }

    fn fire(&self, event: Event, snapshot: &ResponseSnapshot) {
        let Some(mut listener) = self.lock().listener(event).take() else {
            return;
        };
        listener(snapshot as &dyn ResponseView);
        let mut state = self.lock();
        let slot = state.listener(event);
        // The listener may have been rebound while it ran.
        if slot.is_none() {
            *slot = Some(listener);
        }
    }
}

impl fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("FakeTransport")
            .field("ready_state", &state.response.ready_state)
            .field("opened", &state.opened)
            .field("send_count", &state.send_count)
            .field("abort_count", &state.abort_count)
            .finish()
    }
}

impl TransportHandle for FakeTransport {
    fn open(
        &mut self,
        method: HttpMethod,
        url: &str,
        asynchronous: bool,
        credentials: Option<Credentials<'_>>,
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.check(FailPoint::Open)?;
        state.opened = Some(OpenCall {
            method,
            url: url.to_string(),
            asynchronous,
            user: credentials.map(|c| c.user.to_string()),
            password: credentials.and_then(|c| c.password.map(str::to_string)),
        });
        state.headers.clear();
        state.headers_at_send = None;
        state.sent_body = None;
        state.response = ResponseSnapshot {
            ready_state: ReadyState::Opened,
            ..ResponseSnapshot::default()
        };
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.lock().timeout = timeout;
        Ok(())
    }

    fn set_with_credentials(&mut self, with_credentials: bool) -> Result<(), TransportError> {
        self.lock().with_credentials = Some(with_credentials);
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.require_opened("set_request_header")?;
        state.check(FailPoint::SetRequestHeader)?;
        // Setting a header twice appends, as browser transports do.
        state
            .headers
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
        Ok(())
    }

    fn set_response_type(&mut self, response_type: ResponseType) -> Result<(), TransportError> {
        let mut state = self.lock();
        if state.rejected_response_types.contains(&response_type) {
            return Err(TransportError::UnsupportedResponseType(
                response_type.to_string(),
            ));
        }
        state.response_type = Some(response_type);
        Ok(())
    }

    fn on_ready_state_change(&mut self, listener: Listener) {
        self.lock().on_ready_state_change = Some(listener);
    }

    fn on_timeout(&mut self, listener: Listener) {
        self.lock().on_timeout = Some(listener);
    }

    fn send(&mut self, body: Option<&str>) -> Result<(), TransportError> {
        let reply = {
            let mut state = self.lock();
            state.require_opened("send")?;
            state.check(FailPoint::Send)?;
            state.send_count += 1;
            let headers = state.headers.clone();
            state.headers_at_send = Some(headers);
            state.sent_body = Some(body.map(str::to_string));
            state.reply_on_send.clone()
        };
        if let Some(snapshot) = reply {
            self.complete(snapshot);
        }
        Ok(())
    }

    fn abort(&mut self) {
        let in_flight = {
            let mut state = self.lock();
            state.abort_count += 1;
            !matches!(state.response.ready_state, ReadyState::Unsent | ReadyState::Done)
        };
        if in_flight {
            let snapshot = self.finish_without_response();
            self.fire(Event::ReadyStateChange, &snapshot);
        }
        self.lock().response.ready_state = ReadyState::Unsent;
    }

    fn ready_state(&self) -> ReadyState {
        self.lock().response.ready_state
    }
}

/// Factory handing out clones of preconfigured fakes. A variant left unset
/// fails with [`TransportError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    same_domain: Option<FakeTransport>,
    cross_domain: Option<FakeTransport>,
    created: Arc<Mutex<Vec<TransportKind>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_same_domain(mut self, transport: FakeTransport) -> Self {
        self.same_domain = Some(transport);
        self
    }

    pub fn with_cross_domain(mut self, transport: FakeTransport) -> Self {
        self.cross_domain = Some(transport);
        self
    }

    /// Variants handed out so far, in order.
    pub fn created(&self) -> Vec<TransportKind> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn hand_out(
        &self,
        kind: TransportKind,
        transport: &Option<FakeTransport>,
    ) -> Result<FakeTransport, TransportError> {
        let transport = transport
            .clone()
            .ok_or_else(|| TransportError::Unavailable(format!("{kind:?}")))?;
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(kind);
        Ok(transport)
    }
}

impl TransportFactory for FakeFactory {
    type SameDomain = FakeTransport;
    type CrossDomain = FakeTransport;

    fn same_domain(&self) -> Result<FakeTransport, TransportError> {
        self.hand_out(TransportKind::SameDomain, &self.same_domain)
    }

    fn cross_domain(&self) -> Result<FakeTransport, TransportError> {
        self.hand_out(TransportKind::CrossDomain, &self.cross_domain)
    }
}

/// What a [`RecordingObserver`] saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<T> {
    Next(T),
    Error { kind: ErrorKind, message: String },
    Completed,
}

/// Observer that records every notification it receives.
#[derive(Debug)]
pub struct RecordingObserver<T> {
    notifications: Arc<Mutex<Vec<Notification<T>>>>,
}

impl<T> RecordingObserver<T> {
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(&self, notification: Notification<T>) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }

    pub fn notifications(&self) -> Vec<Notification<T>>
    where
        T: Clone,
    {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|n| match n {
                Notification::Error { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn errored(&self) -> bool {
        !self.error_kinds().is_empty()
    }
}

impl<T> Default for RecordingObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordingObserver<T> {
    fn clone(&self) -> Self {
        Self {
            notifications: Arc::clone(&self.notifications),
        }
    }
}

impl<T: Send + 'static> Observer<T> for RecordingObserver<T> {
    fn on_next(&mut self, value: T) {
        self.push(Notification::Next(value));
    }

    fn on_error(&mut self, error: RequestError) {
        self.push(Notification::Error {
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    fn on_completed(&mut self) {
        self.push(Notification::Completed);
    }
}
