use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, trace, warn};

use crate::socket::{CloseInfo, Connector, Outbound, Socket, SocketEvent};

/// WebSocket transport.
///
/// Each [`Connector::open`] spawns a task on the current tokio runtime that
/// connects, reports `Open`, then pumps outbound text frames and inbound
/// frames until either side closes. Must be called from within a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "websocket"
    }
}

impl Connector for WsConnector {
    fn open(&self, url: &str) -> Socket {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ev_tx, ev_rx) = mpsc::unbounded_channel();
        debug!(%url, transport = self.transport_name(), "spawning socket task");
        tokio::spawn(run_socket(url.to_string(), out_rx, ev_tx));
        Socket::new(url, out_tx, ev_rx)
    }
}

async fn run_socket(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    debug!(%url, "opening websocket");

    let stream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(err) => {
                warn!(%url, error = %err, "websocket connect failed");
                let _ = events.send(SocketEvent::Error(err.to_string()));
                let _ = events.send(SocketEvent::Closed(CloseInfo::abnormal(format!(
                    "connect failed: {err}"
                ))));
                return;
            }
        },
        _ = events.closed() => {
            debug!(%url, "socket handle dropped while opening");
            return;
        }
    };

    info!(%url, "websocket open");
    if events.send(SocketEvent::Open).is_err() {
        return;
    }

    let (mut sink, mut stream) = stream.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    trace!(%url, size = text.len(), "ws [out]");
                    if let Err(err) = sink.send(WsMessage::Text(text)).await {
                        warn!(%url, error = %err, "websocket write failed");
                        let _ = events.send(SocketEvent::Error(err.to_string()));
                        let _ = events.send(SocketEvent::Closed(CloseInfo::abnormal(err.to_string())));
                        return;
                    }
                }
                Some(Outbound::Close(close)) => {
                    debug!(%url, ?close, "closing websocket");
                    let frame = close.map(|close| CloseFrame {
                        code: CloseCode::from(close.code),
                        reason: close.reason.into(),
                    });
                    // Keep reading: the peer's close reply ends the loop.
                    let _ = sink.send(WsMessage::Close(frame)).await;
                }
                None => {
                    debug!(%url, "socket handle dropped; closing websocket");
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    trace!(%url, size = text.len(), "ws [in]");
                    if events.send(SocketEvent::Message(text)).is_err() {
                        return;
                    }
                }
                Some(Ok(WsMessage::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => {
                        if events.send(SocketEvent::Message(text)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(%url, size = err.as_bytes().len(), "dropping non-UTF-8 binary frame");
                    }
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let close = frame
                        .map(|frame| CloseInfo::new(u16::from(frame.code), frame.reason.into_owned()))
                        .unwrap_or_else(CloseInfo::no_status);
                    info!(%url, %close, "websocket closed by peer");
                    let _ = sink.close().await;
                    let _ = events.send(SocketEvent::Closed(close));
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%url, error = %err, "websocket read failed");
                    let _ = events.send(SocketEvent::Error(err.to_string()));
                    let _ = events.send(SocketEvent::Closed(CloseInfo::abnormal(err.to_string())));
                    return;
                }
                None => {
                    info!(%url, "websocket stream ended");
                    let _ = events.send(SocketEvent::Closed(CloseInfo::abnormal("stream ended")));
                    return;
                }
            }
        }
    }
}
