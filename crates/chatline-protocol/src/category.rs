//! Message categories.
//!
//! The category is a pure function of the type tag's suffix.

use std::fmt;

/// Request type suffix.
pub const REQUEST_SUFFIX: &str = "-req";

/// Response type suffix.
pub const RESPONSE_SUFFIX: &str = "-res";

/// Feed type suffix.
pub const FEED_SUFFIX: &str = "-feed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    Request,
    Response,
    Feed,
    Unknown,
}

/// Classify a message type tag.
pub fn category(kind: &str) -> MessageCategory {
    if kind.ends_with(REQUEST_SUFFIX) {
        MessageCategory::Request
    } else if kind.ends_with(RESPONSE_SUFFIX) {
        MessageCategory::Response
    } else if kind.ends_with(FEED_SUFFIX) {
        MessageCategory::Feed
    } else {
        MessageCategory::Unknown
    }
}

impl MessageCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageCategory::Request => "request",
            MessageCategory::Response => "response",
            MessageCategory::Feed => "feed",
            MessageCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
