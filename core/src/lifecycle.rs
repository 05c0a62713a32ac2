//! Driving one transport handle from open to its terminal event.
//!
//! # Design
//! Every request shares a `RequestState` between the handle's callbacks and
//! the dispose path. The state holds the request's completion in a slot;
//! whoever takes it out first (ready-state callback, timeout callback,
//! setup failure, or dispose) decides how the request ends, and everyone
//! after finds the slot empty and does nothing. Taking is done under a
//! mutex, so callbacks fired from another thread race safely with dispose.
//!
//! The handle itself sits behind its own mutex so dispose can check its
//! ready state and abort it. Callbacks never lock the handle; they get its
//! state as a `ResponseView` argument, which keeps handles free to fire them
//! synchronously from inside `send` or `abort`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, debug_span, warn};
use uuid::Uuid;

use crate::classify::classify;
use crate::config::RequestConfig;
use crate::context::{RequestContext, ResponseTransform};
use crate::error::{RequestError, TransportError};
use crate::http::{HttpMethod, ResponseType};
use crate::observer::Completion;
use crate::transport::{Credentials, Listener, ResponseView, TransportHandle};

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct RequestState<T> {
    id: Uuid,
    completion: Mutex<Option<Box<dyn Completion<T>>>>,
}

impl<T> RequestState<T> {
    pub(crate) fn new(completion: Box<dyn Completion<T>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            completion: Mutex::new(Some(completion)),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Mark the request done. Only the first caller gets the completion.
    fn finish(&self) -> Option<Box<dyn Completion<T>>> {
        lock(&self.completion).take()
    }

    /// End the request with `error` unless it already ended.
    pub(crate) fn fail(&self, error: RequestError) {
        if let Some(completion) = self.finish() {
            completion.complete(Err(error));
        }
    }
}

/// Open, arm and send `handle`; return the handle's dispose entry point.
pub(crate) fn launch<H, T>(
    handle: H,
    config: RequestConfig,
    method: Option<HttpMethod>,
    context: &RequestContext<T>,
    state: Arc<RequestState<T>>,
) -> Subscription
where
    H: TransportHandle,
    T: Send + 'static,
{
    let method = method.unwrap_or(config.method);
    let span = debug_span!("request", request_id = %state.id, %method, url = %config.url);
    let _entered = span.enter();

    let handle = Arc::new(Mutex::new(handle));
    let setup = arm_and_send(&mut *lock(&handle), config, method, context, &state);
    if let Err(err) = setup {
        warn!(error = %err, "request setup failed");
        state.fail(RequestError::RequestSetup(err));
    }

    Subscription::new(move || dispose(&handle, &state))
}

fn arm_and_send<H, T>(
    handle: &mut H,
    mut config: RequestConfig,
    method: HttpMethod,
    context: &RequestContext<T>,
    state: &Arc<RequestState<T>>,
) -> Result<(), TransportError>
where
    H: TransportHandle,
    T: Send + 'static,
{
    let credentials = config.user.as_deref().map(|user| Credentials {
        user,
        password: config.password.as_deref(),
    });
    handle.open(method, &config.url, config.asynchronous, credentials)?;

    handle.set_timeout(config.timeout)?;
    handle.set_with_credentials(config.with_credentials)?;
    for (name, value) in &config.headers {
        handle.set_request_header(name, value)?;
    }
    apply_response_type(handle, config.response_type)?;

    handle.on_ready_state_change(ready_listener(state, context.response_transform.clone()));
    handle.on_timeout(timeout_listener(state));

    if let Some(hook) = &context.on_before_request {
        let applied = config.headers.clone();
        hook(&mut config);
        apply_added_headers(handle, &applied, &config)?;
    }

    debug!(has_body = config.data.is_some(), "sending request");
    handle.send(config.data.as_deref())
}

/// Set the headers `config` gained since `applied` was sent to the handle.
///
/// A handle cannot replace a header it already carries (setting it again
/// appends a second value), so values the hook changed stay as first set.
fn apply_added_headers<H: TransportHandle>(
    handle: &mut H,
    applied: &BTreeMap<String, String>,
    config: &RequestConfig,
) -> Result<(), TransportError> {
    for (name, value) in &config.headers {
        let previous = applied
            .iter()
            .find(|(set, _)| set.eq_ignore_ascii_case(name))
            .map(|(_, previous)| previous);
        match previous {
            None => handle.set_request_header(name, value)?,
            Some(previous) if previous != value => {
                debug!(header = %name, "header changed after it was set, keeping the first value");
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Transports that cannot decode JSON themselves are fine: the response
/// transform parses the body either way. Any other rejection is fatal.
fn apply_response_type<H: TransportHandle>(
    handle: &mut H,
    response_type: ResponseType,
) -> Result<(), TransportError> {
    match handle.set_response_type(response_type) {
        Ok(()) => Ok(()),
        Err(err) if response_type == ResponseType::Json => {
            debug!(error = %err, "json response type rejected, parsing client-side");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn ready_listener<T>(state: &Arc<RequestState<T>>, transform: ResponseTransform<T>) -> Listener
where
    T: Send + 'static,
{
    let state = Arc::clone(state);
    Box::new(move |view: &dyn ResponseView| {
        if !view.ready_state().is_done() {
            return;
        }
        let Some(completion) = state.finish() else {
            return;
        };
        if !completion.is_active() {
            debug!(request_id = %state.id, "consumer detached, skipping classification");
            return;
        }
        let outcome = classify(view, &transform);
        debug!(
            request_id = %state.id,
            status = view.status(),
            success = outcome.is_ok(),
            "request completed"
        );
        completion.complete(outcome);
    })
}

fn timeout_listener<T>(state: &Arc<RequestState<T>>) -> Listener
where
    T: Send + 'static,
{
    let state = Arc::clone(state);
    Box::new(move |_: &dyn ResponseView| {
        if let Some(completion) = state.finish() {
            debug!(request_id = %state.id, "request timed out");
            completion.complete(Err(RequestError::timeout()));
        }
    })
}

fn dispose<H: TransportHandle, T>(handle: &Mutex<H>, state: &RequestState<T>) {
    if state.finish().is_none() {
        return;
    }
    let mut handle = lock(handle);
    if handle.ready_state().is_done() {
        debug!(request_id = %state.id, "disposed after transport finished");
        return;
    }
    debug!(request_id = %state.id, "aborting request");
    handle.abort();
}

/// Cancels a started request.
///
/// Disposing before the request ends aborts the transport and suppresses
/// every further event. Disposing afterwards, or twice, does nothing.
/// Dropping a `Subscription` without disposing leaves the request running.
#[must_use = "dropping a Subscription does not cancel the request"]
pub struct Subscription {
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    /// A subscription for a request that ended before it started.
    pub(crate) fn closed() -> Self {
        Self { disposer: None }
    }

    pub fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposer.is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
