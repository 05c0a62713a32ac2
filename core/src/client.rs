//! Entry point: turn configuration plus hooks into a cold, cancellable
//! request.
//!
//! # Design
//! `XhrClient` holds only the transport factory. `request` builds a
//! `Request` descriptor and does no work; each `subscribe`/`stream` call on
//! it performs a fresh merge, transport acquisition and send, so a caller
//! that wants to retry subscribes again.

use std::sync::Arc;

use futures::channel::oneshot;
use tracing::warn;

use crate::acquire::acquire;
use crate::config::{ConfigOverrides, RequestConfig};
use crate::context::RequestContext;
use crate::http::HttpMethod;
use crate::lifecycle::{launch, RequestState, Subscription};
use crate::observer::{Completion, Observer, ObserverCompletion};
use crate::stream::ResponseStream;
use crate::transport::TransportFactory;

/// Issues requests through handles from one transport factory.
#[derive(Debug)]
pub struct XhrClient<F> {
    factory: Arc<F>,
}

impl<F> Clone for XhrClient<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F: TransportFactory> XhrClient<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Describe a request. `method`, when given, takes precedence over
    /// `options.method`.
    pub fn request<T>(
        &self,
        method: Option<HttpMethod>,
        options: ConfigOverrides,
        context: RequestContext<T>,
    ) -> Request<F, T> {
        Request {
            factory: Arc::clone(&self.factory),
            method,
            options,
            context,
        }
    }

    pub fn get<T>(&self, options: ConfigOverrides, context: RequestContext<T>) -> Request<F, T> {
        self.request(Some(HttpMethod::Get), options, context)
    }

    pub fn post<T>(&self, options: ConfigOverrides, context: RequestContext<T>) -> Request<F, T> {
        self.request(Some(HttpMethod::Post), options, context)
    }
}

/// A request that has not started. Nothing happens until it is subscribed.
#[derive(Debug)]
pub struct Request<F, T> {
    factory: Arc<F>,
    method: Option<HttpMethod>,
    options: ConfigOverrides,
    context: RequestContext<T>,
}

impl<F: TransportFactory, T: Send + 'static> Request<F, T> {
    /// Start the request, delivering its outcome to `observer`.
    pub fn subscribe<O: Observer<T>>(&self, observer: O) -> Subscription {
        self.start(Box::new(ObserverCompletion(observer)))
    }

    /// Start the request as a stream of at most one outcome.
    pub fn stream(&self) -> ResponseStream<T> {
        let (sender, receiver) = oneshot::channel();
        let subscription = self.start(Box::new(sender));
        ResponseStream::new(receiver, subscription)
    }

    fn start(&self, completion: Box<dyn Completion<T>>) -> Subscription {
        let state = Arc::new(RequestState::new(completion));
        let mut config = RequestConfig::merge(self.options.clone());
        match acquire(&*self.factory, &mut config) {
            Ok(transport) => launch(transport, config, self.method, &self.context, state),
            Err(err) => {
                warn!(request_id = %state.id(), url = %config.url, error = %err, "could not acquire transport");
                state.fail(err);
                Subscription::closed()
            }
        }
    }
}
