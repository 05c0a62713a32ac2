//! `futures::Stream` face of a started request.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::ready;
use futures::stream::{FusedStream, Stream};

use crate::error::Outcome;
use crate::lifecycle::Subscription;

/// Yields at most one `Outcome`, then ends.
///
/// Ends without an item when the request was cancelled. Dropping the stream
/// before it yields cancels the request.
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct ResponseStream<T> {
    receiver: Option<oneshot::Receiver<Outcome<T>>>,
    subscription: Subscription,
}

impl<T> ResponseStream<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<Outcome<T>>, subscription: Subscription) -> Self {
        Self {
            receiver: Some(receiver),
            subscription,
        }
    }

    /// Cancel the request. The stream ends without yielding.
    pub fn cancel(&mut self) {
        self.receiver = None;
        self.subscription.dispose();
    }
}

impl<T> Stream for ResponseStream<T> {
    type Item = Outcome<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Ready(None);
        };
        let outcome = ready!(Pin::new(receiver).poll(cx)).ok();
        self.receiver = None;
        Poll::Ready(outcome)
    }
}

impl<T> FusedStream for ResponseStream<T> {
    fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }
}

impl<T> Drop for ResponseStream<T> {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}
