//! Typed chat operations on top of a [`Connection`].

use std::future::Future;
use std::time::Duration;

use chatline_protocol::{JoinRoomResponse, ListRoomsResponse, Message};
use serde::Serialize;
use tokio::time::Instant;

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::error::Result;
use crate::feed::FeedStream;
use crate::status::StatusStream;

/// Room membership after a successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedRoom {
    pub room: String,
    pub people: Vec<String>,
}

/// Chat client facade.
#[derive(Debug, Clone)]
pub struct ChatClient {
    connection: Connection,
}

impl ChatClient {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Chat client over WebSocket.
    pub fn websocket(config: ConnectionConfig) -> Self {
        Self::new(Connection::websocket(config))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub async fn login(&self, nick: &str) -> Result<()> {
        self.connection.send(Message::login(nick)).await?;
        Ok(())
    }

    pub async fn list_rooms(&self) -> Result<Vec<String>> {
        let response = self.connection.send(Message::list_rooms()).await?;
        let listing: ListRoomsResponse = response.payload_as()?;
        Ok(listing.rooms)
    }

    /// Join a room. The server may omit the room name; the requested one is
    /// used then.
    pub async fn join_room(&self, room: &str) -> Result<JoinedRoom> {
        let response = self.connection.send(Message::join_room(room)).await?;
        let joined: JoinRoomResponse = response.payload_as()?;
        Ok(JoinedRoom {
            room: joined.room.unwrap_or_else(|| room.to_string()),
            people: joined.people,
        })
    }

    pub async fn leave_room(&self, room: &str) -> Result<()> {
        self.connection.send(Message::leave_room(room)).await?;
        Ok(())
    }

    pub async fn say(&self, room: &str, msg: &str) -> Result<()> {
        self.connection.send(Message::say(room, msg)).await?;
        Ok(())
    }

    pub async fn whisper(&self, to: &str, msg: &str) -> Result<()> {
        self.connection.send(Message::whisper(to, msg)).await?;
        Ok(())
    }

    /// Round trip of one `ping-req`, connection setup included if the
    /// connection was not open yet.
    pub async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        self.connection.send(Message::ping()).await?;
        Ok(started.elapsed())
    }

    /// Send any request and return the raw response.
    ///
    /// Queued immediately, like [`Connection::send`].
    pub fn send(&self, message: Message) -> impl Future<Output = Result<Message>> + Send + 'static {
        self.connection.send(message)
    }

    pub fn feeds(&self) -> FeedStream {
        self.connection.feed()
    }

    pub fn status(&self) -> StatusStream {
        self.connection.status()
    }

    pub async fn close(&self) -> Result<()> {
        self.connection.close().await
    }
}
