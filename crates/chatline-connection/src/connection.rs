//! The connection handle and the driver task that owns the socket.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chatline_protocol::{decode, Message, MessageCategory};
use chatline_transport::{CloseInfo, Connector, Endpoint, SocketEvent, WsConnector};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::config::ConnectionConfig;
use crate::correlator::{Correlator, Reply};
use crate::error::{ChatError, Result};
use crate::feed::{FeedDispatcher, FeedStream};
use crate::lifecycle::{Link, LinkEvent, QueuedSend};
use crate::status::{ConnectionStatus, StatusBroadcast, StatusStream};

const CLIENT_CLOSE_REASON: &str = "closed by client";

enum Command {
    Send { message: Message, reply: Reply },
    Close { done: oneshot::Sender<()> },
}

struct Shared {
    endpoint: Endpoint,
    status: StatusBroadcast,
    feed: FeedDispatcher,
}

/// Handle to one chat connection.
///
/// Cheap to clone. All clones talk to the same driver task, which owns the
/// socket, the pending requests and the id counter. The driver stops once
/// every handle is dropped.
#[derive(Clone)]
pub struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
}

impl Connection {
    /// Create a connection opening its sockets through `connector`.
    ///
    /// Nothing is opened until the first [`send`](Connection::send). Must be
    /// called from within a tokio runtime.
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        let shared = Arc::new(Shared {
            endpoint: config.endpoint.clone(),
            status: StatusBroadcast::new(config.status_capacity),
            feed: FeedDispatcher::new(config.feed_capacity),
        });
        let (commands, receiver) = mpsc::unbounded_channel();

        let driver = Driver {
            shared: Arc::clone(&shared),
            connector,
            commands: receiver,
            link: Link::Absent,
            correlator: Correlator::new(config.request_timeout),
            settle_delay: config.settle_delay,
            #[cfg(feature = "schema")]
            schema: config.schema_registry,
        };
        tokio::spawn(driver.run());

        Self { commands, shared }
    }

    /// Create a connection over WebSocket.
    pub fn websocket(config: ConnectionConfig) -> Self {
        Self::new(config, Arc::new(WsConnector::new()))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    /// Send a request and wait for its response.
    ///
    /// Opens the connection if there is none, or joins the attempt already
    /// opening. The message gets a fresh correlation id; any id it carries is
    /// replaced. Resolves with the full response on status `ok`.
    ///
    /// The request is queued when `send` is called, not when the returned
    /// future is first polled, so requests go out in call order.
    pub fn send(&self, message: Message) -> impl Future<Output = Result<Message>> + Send + 'static {
        let (reply, response) = oneshot::channel();
        let queued = self
            .commands
            .send(Command::Send { message, reply })
            .map_err(|_| ChatError::Shutdown);
        async move {
            queued?;
            response.await.map_err(|_| ChatError::Shutdown)?
        }
    }

    /// Subscribe to feed messages arriving from now on.
    pub fn feed(&self) -> FeedStream {
        self.shared.feed.subscribe()
    }

    /// Subscribe to status transitions, starting with the current status.
    pub fn status(&self) -> StatusStream {
        self.shared.status.subscribe()
    }

    /// The most recent status, `None` before the first send.
    pub fn current_status(&self) -> Option<ConnectionStatus> {
        self.shared.status.current()
    }

    /// Close the current socket, if any.
    ///
    /// Outstanding requests fail as on any other disconnect. A later send
    /// opens a new socket.
    pub async fn close(&self) -> Result<()> {
        let (done, closed) = oneshot::channel();
        self.commands
            .send(Command::Close { done })
            .map_err(|_| ChatError::Shutdown)?;
        closed.await.map_err(|_| ChatError::Shutdown)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.shared.endpoint)
            .field("status", &self.shared.status.current())
            .finish()
    }
}

/// Single owner of the link and the correlator.
///
/// Commands, socket events and deadlines are handled one at a time, socket
/// events first, so a transport loss is fully processed before the next send.
struct Driver {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    commands: mpsc::UnboundedReceiver<Command>,
    link: Link,
    correlator: Correlator,
    settle_delay: Duration,
    #[cfg(feature = "schema")]
    schema: Option<Arc<chatline_schema::SchemaRegistry>>,
}

impl Driver {
    async fn run(mut self) {
        debug!(url = %self.shared.endpoint, "connection driver started");
        loop {
            tokio::select! {
                biased;
                event = self.link.next() => self.on_link_event(event),
                Some(id) = self.correlator.next_expired(), if self.correlator.has_deadlines() => {
                    self.correlator.expire(&id);
                }
                command = self.commands.recv() => match command {
                    Some(Command::Send { message, reply }) => self.on_send(message, reply),
                    Some(Command::Close { done }) => {
                        self.on_close();
                        let _ = done.send(());
                    }
                    None => break,
                },
            }
        }
        self.shutdown();
    }

    fn on_send(&mut self, message: Message, reply: Reply) {
        #[cfg(feature = "schema")]
        if let Some(registry) = &self.schema {
            if let Err(err) = registry.validate(&message) {
                warn!(kind = %message.kind, error = %err, "refusing invalid request");
                let _ = reply.send(Err(err.into()));
                return;
            }
        }

        match &mut self.link {
            Link::Open { socket } => self.correlator.dispatch(message, reply, socket),
            Link::Opening { queued, .. } => {
                trace!(kind = %message.kind, queued = queued.len() + 1, "queueing request");
                queued.push(QueuedSend { message, reply });
            }
            Link::Absent => {
                let url = self.shared.endpoint.url();
                info!(%url, "opening connection");
                let socket = self.connector.open(url);
                self.link = Link::Opening {
                    socket,
                    settle: None,
                    queued: vec![QueuedSend { message, reply }],
                };
                self.shared.status.publish(ConnectionStatus::Opening);
            }
        }
    }

    fn on_close(&mut self) {
        let close = CloseInfo::normal(CLIENT_CLOSE_REASON);
        if let Some(socket) = self.link.socket() {
            let _ = socket.close(Some(close.clone()));
        }
        self.teardown(close);
    }

    fn on_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Settled => self.on_settled(),
            LinkEvent::Socket(Some(SocketEvent::Open)) => {
                if self.link.arm_settle(self.settle_delay) {
                    debug!(url = %self.shared.endpoint, delay = ?self.settle_delay, "socket open; settling");
                } else {
                    warn!(state = self.link.name(), "ignoring unexpected open event");
                }
            }
            LinkEvent::Socket(Some(SocketEvent::Message(text))) => self.on_frame(&text),
            LinkEvent::Socket(Some(SocketEvent::Error(description))) => {
                warn!(url = %self.shared.endpoint, error = %description, "socket error");
                self.teardown(CloseInfo::abnormal(description));
            }
            LinkEvent::Socket(Some(SocketEvent::Closed(close))) => self.teardown(close),
            LinkEvent::Socket(None) => self.teardown(CloseInfo::abnormal("transport ended")),
        }
    }

    fn on_settled(&mut self) {
        match std::mem::replace(&mut self.link, Link::Absent) {
            Link::Opening { socket, queued, .. } => {
                info!(url = %self.shared.endpoint, queued = queued.len(), "connection open");
                self.shared.status.publish(ConnectionStatus::Open);
                for QueuedSend { message, reply } in queued {
                    self.correlator.dispatch(message, reply, &socket);
                }
                self.link = Link::Open { socket };
            }
            other => self.link = other,
        }
    }

    fn on_frame(&mut self, text: &str) {
        trace!(frame = %text, "frame [in]");
        let message = match decode(text) {
            Ok(message) => message,
            Err(err) => {
                warn!(size = text.len(), error = %err, "dropping undecodable frame");
                return;
            }
        };

        match message.category() {
            MessageCategory::Response => {
                #[cfg(feature = "schema")]
                if let Some(registry) = &self.schema {
                    if let Err(err) = registry.validate(&message) {
                        warn!(kind = %message.kind, error = %err, "invalid response");
                        let failed = message
                            .id
                            .as_deref()
                            .is_some_and(|id| self.correlator.fail(id, err.into()));
                        if !failed {
                            warn!(kind = %message.kind, "dropping unmatched invalid response");
                        }
                        return;
                    }
                }
                self.correlator.resolve(message);
            }
            MessageCategory::Feed => {
                #[cfg(feature = "schema")]
                if let Some(registry) = &self.schema {
                    if let Err(err) = registry.validate(&message) {
                        warn!(kind = %message.kind, error = %err, "dropping invalid feed");
                        return;
                    }
                }
                let kind = message.kind.clone();
                let receivers = self.shared.feed.publish(message);
                trace!(%kind, receivers, "feed published");
            }
            category => {
                debug!(kind = %message.kind, %category, "ignoring message");
            }
        }
    }

    /// Drop the socket, broadcast `CLOSED` and fail everything outstanding.
    fn teardown(&mut self, close: CloseInfo) {
        let queued = match std::mem::replace(&mut self.link, Link::Absent) {
            Link::Absent => return,
            Link::Opening { queued, .. } => queued,
            Link::Open { .. } => Vec::new(),
        };

        let url = self.shared.endpoint.url();
        info!(
            %url,
            code = close.code,
            reason = %close.reason,
            pending = self.correlator.pending_len(),
            queued = queued.len(),
            "connection closed"
        );
        self.shared.status.publish(ConnectionStatus::Closed);

        for QueuedSend { reply, .. } in queued {
            let _ = reply.send(Err(ChatError::ConnectionClosed {
                url: url.to_string(),
                close: close.clone(),
            }));
        }
        self.correlator
            .fail_all(&format!("connection to {url} went down with {close}"));
    }

    fn shutdown(mut self) {
        if let Link::Opening { queued, .. } = std::mem::replace(&mut self.link, Link::Absent) {
            for QueuedSend { reply, .. } in queued {
                let _ = reply.send(Err(ChatError::Shutdown));
            }
        }
        let failed = self.correlator.fail_all_with(|| ChatError::Shutdown);
        debug!(url = %self.shared.endpoint, failed, "connection driver stopped");
    }
}
