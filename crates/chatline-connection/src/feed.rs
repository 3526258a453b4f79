//! Fan-out of server-push messages.

use std::pin::Pin;
use std::task::{Context, Poll};

use chatline_protocol::Message;
use futures_core::Stream;
use tokio::sync::broadcast;

use crate::subscription::Subscription;

/// Publishes feed messages to every current subscriber.
#[derive(Debug)]
pub(crate) struct FeedDispatcher {
    sender: broadcast::Sender<Message>,
}

impl FeedDispatcher {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish one message. Returns how many subscribers will see it.
    pub(crate) fn publish(&self, message: Message) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub(crate) fn subscribe(&self) -> FeedStream {
        FeedStream {
            inner: Subscription::new("feed", self.sender.subscribe()),
        }
    }
}

/// Stream of feed messages published after the subscription was made.
///
/// Disconnects do not end the stream. It ends only once the connection driver
/// is gone. A subscriber that falls behind skips the messages it missed.
pub struct FeedStream {
    inner: Subscription<Message>,
}

impl FeedStream {
    /// Wait for the next feed message.
    pub async fn recv(&mut self) -> Option<Message> {
        std::future::poll_fn(|cx| self.inner.poll_recv(cx)).await
    }
}

impl Stream for FeedStream {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        self.get_mut().inner.poll_recv(cx)
    }
}

impl std::fmt::Debug for FeedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_messages_in_order() {
        let dispatcher = FeedDispatcher::new(8);
        let mut first = dispatcher.subscribe();
        let mut second = dispatcher.subscribe();

        assert_eq!(dispatcher.publish(Message::ping().with_id("a")), 2);
        assert_eq!(dispatcher.publish(Message::ping().with_id("b")), 2);

        for stream in [&mut first, &mut second] {
            assert_eq!(stream.recv().await.unwrap().id.as_deref(), Some("a"));
            assert_eq!(stream.next().await.unwrap().id.as_deref(), Some("b"));
        }
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let dispatcher = FeedDispatcher::new(8);
        assert_eq!(dispatcher.publish(Message::ping()), 0);

        let mut late = dispatcher.subscribe();
        dispatcher.publish(Message::list_rooms());
        assert_eq!(
            late.recv().await.unwrap().kind,
            chatline_protocol::MessageType::ListRoomsReq
        );
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_ahead() {
        let dispatcher = FeedDispatcher::new(2);
        let mut stream = dispatcher.subscribe();
        for id in ["1", "2", "3", "4"] {
            dispatcher.publish(Message::ping().with_id(id));
        }

        assert_eq!(stream.recv().await.unwrap().id.as_deref(), Some("3"));
        assert_eq!(stream.recv().await.unwrap().id.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn stream_ends_when_dispatcher_is_dropped() {
        let dispatcher = FeedDispatcher::new(2);
        let mut stream = dispatcher.subscribe();
        drop(dispatcher);
        assert!(stream.recv().await.is_none());
    }
}
