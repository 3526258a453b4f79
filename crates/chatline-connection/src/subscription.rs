use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

/// Broadcast receiver that skips lagged items instead of ending.
pub(crate) struct Subscription<T> {
    name: &'static str,
    inner: BroadcastStream<T>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
    pub(crate) fn new(name: &'static str, receiver: broadcast::Receiver<T>) -> Self {
        Self {
            name,
            inner: BroadcastStream::new(receiver),
        }
    }

    pub(crate) fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(item)) => return Poll::Ready(Some(item)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(subscription = self.name, skipped, "subscriber fell behind; skipping");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
