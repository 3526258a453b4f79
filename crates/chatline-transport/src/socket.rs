use std::fmt;

use tokio::sync::mpsc;

use crate::error::{Result, TransportError};

/// Close code and reason reported when a socket goes down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;
    /// The peer closed without a status code.
    pub const NO_STATUS: u16 = 1005;
    /// The connection ended without a close frame, or never opened.
    pub const ABNORMAL: u16 = 1006;

    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn normal(reason: impl Into<String>) -> Self {
        Self::new(Self::NORMAL, reason)
    }

    pub fn no_status() -> Self {
        Self::new(Self::NO_STATUS, "")
    }

    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(Self::ABNORMAL, reason)
    }
}

impl fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "code {}", self.code)
        } else {
            write!(f, "code {}: {}", self.code, self.reason)
        }
    }
}

/// Lifecycle and data events reported by a [`Socket`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The transport finished opening and can carry frames.
    Open,
    /// One inbound text frame.
    Message(String),
    /// A transport error. Usually followed by `Closed`.
    Error(String),
    /// The transport is closed. No further events follow.
    Closed(CloseInfo),
}

/// Commands flowing from a [`Socket`] handle to the task driving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close(Option<CloseInfo>),
}

/// Handle to one socket instance.
///
/// The socket is driven by a separate task (or, for the memory transport, by
/// the test harness). Dropping the handle tears the connection down.
pub struct Socket {
    url: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    events: mpsc::UnboundedReceiver<SocketEvent>,
}

impl Socket {
    /// Assemble a socket from the channels of its driving task.
    pub fn new(
        url: impl Into<String>,
        outbound: mpsc::UnboundedSender<Outbound>,
        events: mpsc::UnboundedReceiver<SocketEvent>,
    ) -> Self {
        Self {
            url: url.into(),
            outbound,
            events,
        }
    }

    /// The URL this socket was opened against.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queue one text frame for transmission.
    ///
    /// Frames are written in the order they are queued.
    pub fn send_text(&self, text: String) -> Result<()> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    /// Ask the transport to close with an optional code and reason.
    pub fn close(&self, close: Option<CloseInfo>) -> Result<()> {
        self.outbound
            .send(Outbound::Close(close))
            .map_err(|_| TransportError::Closed)
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the driving task is gone without reporting `Closed`.
    pub async fn next_event(&mut self) -> Option<SocketEvent> {
        self.events.recv().await
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket").field("url", &self.url).finish()
    }
}

/// Opens sockets.
///
/// `open` must not block: the returned socket starts in the opening phase and
/// reports `Open` (or `Error`/`Closed`) as an event.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, url: &str) -> Socket;
}
