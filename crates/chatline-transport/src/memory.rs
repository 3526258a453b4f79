use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::socket::{CloseInfo, Connector, Outbound, Socket, SocketEvent};

/// In-process transport.
///
/// Every [`Connector::open`] hands the remote end of the new socket to the
/// paired [`MemoryServer`] as a [`MemoryPeer`]. The peer decides when the
/// socket opens, what it receives and how it closes.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<MemoryPeer>,
}

/// Accepts the sockets opened through a [`MemoryConnector`].
#[derive(Debug)]
pub struct MemoryServer {
    incoming: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryConnector {
    /// Create a connector and the server observing it.
    pub fn pair() -> (Self, MemoryServer) {
        let (accepted, incoming) = mpsc::unbounded_channel();
        (Self { accepted }, MemoryServer { incoming })
    }
}

impl Connector for MemoryConnector {
    fn open(&self, url: &str) -> Socket {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ev_tx, ev_rx) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            url: url.to_string(),
            outbound: out_rx,
            events: ev_tx,
        };
        if self.accepted.send(peer).is_err() {
            // Dropping the peer ends the event stream, which reads as a lost transport.
            debug!(%url, "memory server gone; socket will never open");
        }

        Socket::new(url, out_tx, ev_rx)
    }
}

impl MemoryServer {
    /// Wait for the next opened socket.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.incoming.recv().await
    }

    /// Take an already opened socket, if any.
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.incoming.try_recv().ok()
    }
}

/// Remote end of one in-memory socket.
#[derive(Debug)]
pub struct MemoryPeer {
    url: String,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<SocketEvent>,
}

impl MemoryPeer {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Report the socket as open.
    pub fn open(&self) -> Result<()> {
        self.emit(SocketEvent::Open)
    }

    /// Deliver one inbound text frame to the client.
    pub fn push(&self, text: impl Into<String>) -> Result<()> {
        self.emit(SocketEvent::Message(text.into()))
    }

    /// Report a transport error.
    pub fn error(&self, description: impl Into<String>) -> Result<()> {
        self.emit(SocketEvent::Error(description.into()))
    }

    /// Close the socket with a code and reason.
    pub fn close(&self, code: u16, reason: impl Into<String>) -> Result<()> {
        self.emit(SocketEvent::Closed(CloseInfo::new(code, reason)))
    }

    /// Wait for the next text frame sent by the client.
    ///
    /// Returns `None` once the client closes or drops its socket.
    pub async fn recv_text(&mut self) -> Option<String> {
        match self.outbound.recv().await? {
            Outbound::Text(text) => Some(text),
            Outbound::Close(_) => None,
        }
    }

    /// Take a text frame the client already sent, if any.
    pub fn try_recv_text(&mut self) -> Option<String> {
        match self.outbound.try_recv().ok()? {
            Outbound::Text(text) => Some(text),
            Outbound::Close(_) => None,
        }
    }

    /// Wait for the next command from the client, close requests included.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    /// True once the client dropped its socket handle.
    pub fn is_client_gone(&self) -> bool {
        self.events.is_closed()
    }

    fn emit(&self, event: SocketEvent) -> Result<()> {
        self.events.send(event).map_err(|_| TransportError::Closed)
    }
}
