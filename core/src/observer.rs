//! The consumer side of a request.
//!
//! A request terminates exactly once, into whatever `Completion` it was
//! started with: an [`Observer`] for callback-style consumers, or the sending
//! half of a oneshot channel behind a [`ResponseStream`](crate::ResponseStream).

use futures::channel::oneshot;

use crate::error::{Outcome, RequestError};

/// Callback-style stream consumer.
///
/// A request calls either `on_next` followed by `on_completed`, or
/// `on_error`, and nothing after that.
pub trait Observer<T>: Send + 'static {
    fn on_next(&mut self, value: T);
    fn on_error(&mut self, error: RequestError);
    fn on_completed(&mut self);
}

/// Single-use sink for a request's terminal outcome.
pub(crate) trait Completion<T>: Send {
    /// False once nobody is listening for the outcome any more.
    fn is_active(&self) -> bool;

    fn complete(self: Box<Self>, outcome: Outcome<T>);
}

pub(crate) struct ObserverCompletion<O>(pub(crate) O);

impl<T, O: Observer<T>> Completion<T> for ObserverCompletion<O> {
    fn is_active(&self) -> bool {
        true
    }

    fn complete(self: Box<Self>, outcome: Outcome<T>) {
        let mut observer = self.0;
        match outcome {
            Ok(value) => {
                observer.on_next(value);
                observer.on_completed();
            }
            Err(error) => observer.on_error(error),
        }
    }
}

impl<T: Send> Completion<T> for oneshot::Sender<Outcome<T>> {
    fn is_active(&self) -> bool {
        !self.is_canceled()
    }

    fn complete(self: Box<Self>, outcome: Outcome<T>) {
        // A dropped receiver means the consumer already went away.
        let _ = (*self).send(outcome);
    }
}
