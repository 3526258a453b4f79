use std::pin::Pin;
use std::time::Duration;

use chatline_protocol::Message;
use chatline_transport::{Socket, SocketEvent};
use tokio::time::{sleep, Sleep};

use crate::correlator::Reply;

/// A send waiting for the connection attempt to finish opening.
pub(crate) struct QueuedSend {
    pub(crate) message: Message,
    pub(crate) reply: Reply,
}

/// The single connection attempt, if any.
///
/// `Closed` is not a resting state: teardown broadcasts it and returns to
/// `Absent`, so the next send opens a fresh socket.
pub(crate) enum Link {
    Absent,
    Opening {
        socket: Socket,
        /// Armed once the socket reports open.
        settle: Option<Pin<Box<Sleep>>>,
        queued: Vec<QueuedSend>,
    },
    Open {
        socket: Socket,
    },
}

pub(crate) enum LinkEvent {
    Socket(Option<SocketEvent>),
    Settled,
}

impl Link {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Link::Absent => "absent",
            Link::Opening { .. } => "opening",
            Link::Open { .. } => "open",
        }
    }

    pub(crate) fn socket(&self) -> Option<&Socket> {
        match self {
            Link::Absent => None,
            Link::Opening { socket, .. } | Link::Open { socket } => Some(socket),
        }
    }

    /// Start the settling delay. Returns false if it was already running or
    /// the link is not opening.
    pub(crate) fn arm_settle(&mut self, delay: Duration) -> bool {
        match self {
            Link::Opening { settle, .. } if settle.is_none() => {
                *settle = Some(Box::pin(sleep(delay)));
                true
            }
            _ => false,
        }
    }

    /// Wait for the next socket event or the end of the settling delay.
    ///
    /// Never resolves while absent. Socket events win over the settle timer so
    /// a close racing the delay is seen first.
    pub(crate) async fn next(&mut self) -> LinkEvent {
        match self {
            Link::Absent => std::future::pending().await,
            Link::Opening {
                socket,
                settle: Some(settle),
                ..
            } => tokio::select! {
                biased;
                event = socket.next_event() => LinkEvent::Socket(event),
                () = settle.as_mut() => LinkEvent::Settled,
            },
            Link::Opening { socket, .. } | Link::Open { socket } => {
                LinkEvent::Socket(socket.next_event().await)
            }
        }
    }
}
