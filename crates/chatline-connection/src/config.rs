use std::time::Duration;

use chatline_transport::Endpoint;

/// Pause between the socket reporting open and the first request going out.
///
/// The backend can drop the very first frame sent right after the socket opens.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Feed messages buffered per subscriber before it starts skipping.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Status transitions buffered per subscriber.
pub const DEFAULT_STATUS_CAPACITY: usize = 16;

/// Configuration for a [`Connection`](crate::Connection).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Backend address, resolved once per connection.
    pub endpoint: Endpoint,
    /// Delay after open before queued requests are sent.
    pub settle_delay: Duration,
    /// Optional bound on how long a request may wait for its response.
    /// `None` keeps it pending until a response or transport loss.
    pub request_timeout: Option<Duration>,
    pub feed_capacity: usize,
    pub status_capacity: usize,
    /// Validate outbound requests and inbound responses and feeds.
    #[cfg(feature = "schema")]
    pub schema_registry: Option<std::sync::Arc<chatline_schema::SchemaRegistry>>,
}

impl ConnectionConfig {
    /// Default settings against the given endpoint.
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            request_timeout: None,
            feed_capacity: DEFAULT_FEED_CAPACITY,
            status_capacity: DEFAULT_STATUS_CAPACITY,
            #[cfg(feature = "schema")]
            schema_registry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.endpoint.url(), "ws://localhost:8349/chat");
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.feed_capacity, DEFAULT_FEED_CAPACITY);
    }

    #[test]
    fn for_endpoint_keeps_other_defaults() {
        let config = ConnectionConfig::for_endpoint(Endpoint::discover("chat.example.org"));
        assert_eq!(config.endpoint.url(), "ws://chat.example.org:8349/chat");
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
    }
}
