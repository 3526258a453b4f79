use std::fmt;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::subscription::Subscription;

/// State of the current connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Opening,
    Open,
    Closed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Opening => "OPENING",
            ConnectionStatus::Open => "OPEN",
            ConnectionStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StatusInner {
    last: Option<ConnectionStatus>,
    sender: broadcast::Sender<ConnectionStatus>,
}

/// Current status plus fan-out of every transition.
///
/// Subscribing and publishing share one lock, so a subscriber gets the replayed
/// value followed by every later transition with no gap and no duplicate.
pub(crate) struct StatusBroadcast {
    inner: Mutex<StatusInner>,
}

impl StatusBroadcast {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Mutex::new(StatusInner { last: None, sender }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, status: ConnectionStatus) {
        let mut inner = self.lock();
        inner.last = Some(status);
        let _ = inner.sender.send(status);
    }

    pub(crate) fn current(&self) -> Option<ConnectionStatus> {
        self.lock().last
    }

    pub(crate) fn subscribe(&self) -> StatusStream {
        let inner = self.lock();
        StatusStream {
            replay: inner.last,
            inner: Subscription::new("status", inner.sender.subscribe()),
        }
    }
}

/// Stream of connection status transitions.
///
/// Starts with the most recent status, if any transition has happened yet.
pub struct StatusStream {
    replay: Option<ConnectionStatus>,
    inner: Subscription<ConnectionStatus>,
}

impl StatusStream {
    /// Wait for the next status.
    pub async fn recv(&mut self) -> Option<ConnectionStatus> {
        std::future::poll_fn(|cx| self.poll_status(cx)).await
    }

    fn poll_status(&mut self, cx: &mut Context<'_>) -> Poll<Option<ConnectionStatus>> {
        if let Some(status) = self.replay.take() {
            return Poll::Ready(Some(status));
        }
        self.inner.poll_recv(cx)
    }
}

impl Stream for StatusStream {
    type Item = ConnectionStatus;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ConnectionStatus>> {
        self.get_mut().poll_status(cx)
    }
}

impl fmt::Debug for StatusStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusStream")
            .field("replay", &self.replay)
            .finish_non_exhaustive()
    }
}
