//! End-to-end behavior over a real WebSocket server on localhost.

use std::time::Duration;

use chatline_connection::{ChatClient, ChatError, ConnectionConfig, ConnectionStatus};
use chatline_protocol::{decode, Message, MessageType};
use chatline_transport::Endpoint;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn local_listener() -> (TcpListener, Endpoint) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");
    let endpoint = Endpoint::from_url(format!("ws://{addr}/chat")).expect("url should be valid");
    (listener, endpoint)
}

fn fast_config(endpoint: Endpoint) -> ConnectionConfig {
    ConnectionConfig {
        settle_delay: Duration::from_millis(20),
        request_timeout: Some(Duration::from_secs(5)),
        ..ConnectionConfig::for_endpoint(endpoint)
    }
}

fn response_to(request: &Message, payload: serde_json::Value) -> WsMessage {
    let kind = request
        .kind
        .response_kind()
        .expect("request type should have a response type");
    WsMessage::Text(
        json!({ "id": request.id, "type": kind.as_str(), "payload": payload }).to_string(),
    )
}

#[tokio::test]
async fn login_join_and_feed_over_websocket() {
    let (listener, endpoint) = local_listener().await;

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("server should accept");
        let mut ws = tokio_tungstenite::accept_async(tcp)
            .await
            .expect("handshake should succeed");

        while let Some(frame) = ws.next().await {
            let text = match frame.expect("frame should be valid") {
                WsMessage::Text(text) => text,
                WsMessage::Close(_) => break,
                _ => continue,
            };
            let request = decode(&text).expect("request should decode");
            match request.kind {
                MessageType::LoginReq => {
                    ws.send(response_to(&request, json!({ "status": "ok" })))
                        .await
                        .expect("server should reply");
                }
                MessageType::JoinRoomReq => {
                    ws.send(response_to(
                        &request,
                        json!({ "status": "ok", "room": "lobby", "people": ["ada"] }),
                    ))
                    .await
                    .expect("server should reply");
                    let feed = json!({
                        "type": "room-chat-feed",
                        "payload": { "who": "bob", "msg": "welcome", "room": "lobby" }
                    });
                    ws.send(WsMessage::Text(feed.to_string()))
                        .await
                        .expect("server should push feed");
                }
                _ => {
                    ws.send(response_to(
                        &request,
                        json!({ "status": "ko", "why": "not here" }),
                    ))
                    .await
                    .expect("server should reply");
                }
            }
        }
    });

    let client = ChatClient::websocket(fast_config(endpoint));
    let mut feeds = client.feeds();

    client.login("ada").await.expect("login should succeed");
    let joined = client.join_room("lobby").await.expect("join should succeed");
    assert_eq!(joined.people, vec!["ada"]);

    let feed = feeds.next().await.expect("feed should arrive");
    assert_eq!(feed.kind, MessageType::RoomChatFeed);
    assert_eq!(feed.payload["msg"], json!("welcome"));

    let err = client.whisper("bob", "psst").await.unwrap_err();
    assert_eq!(err.to_string(), "not here");

    client.close().await.expect("close should succeed");
    server.await.expect("server task should finish");
}

#[tokio::test]
async fn server_close_fails_pending_request() {
    let (listener, endpoint) = local_listener().await;

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("server should accept");
        let mut ws = tokio_tungstenite::accept_async(tcp)
            .await
            .expect("handshake should succeed");
        // Swallow the request, then go away.
        let _ = ws.next().await;
        ws.close(Some(CloseFrame {
            code: CloseCode::Error,
            reason: "maintenance".into(),
        }))
        .await
        .expect("server should close");
    });

    let client = ChatClient::websocket(fast_config(endpoint));
    let mut status = client.status();

    let err = client.list_rooms().await.unwrap_err();
    assert!(matches!(err, ChatError::ConnectionLost { .. }), "{err:?}");
    assert!(err.to_string().contains("1011"), "{err}");
    assert!(err.to_string().contains("maintenance"), "{err}");

    assert_eq!(status.next().await, Some(ConnectionStatus::Opening));
    assert_eq!(status.next().await, Some(ConnectionStatus::Open));
    assert_eq!(status.next().await, Some(ConnectionStatus::Closed));

    server.await.expect("server task should finish");
}

#[tokio::test]
async fn unreachable_server_fails_queued_request() {
    let (listener, endpoint) = local_listener().await;
    drop(listener);

    let client = ChatClient::websocket(fast_config(endpoint));
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ChatError::ConnectionClosed { .. }), "{err:?}");
    assert!(err.is_connection_error());
}
