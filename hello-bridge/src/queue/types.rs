//! Queue constants and the message type carried through the bridge.

use std::borrow::Cow;
use std::time::Duration;

use lapin::message::Delivery;

/// Queue shared by the edge service, the publisher and the worker.
pub const QUEUE_NAME: &str = "hello";

/// Content type attached to every published message.
pub const CONTENT_TYPE: &str = "text/plain";

/// Body published by the one-shot publisher utility.
pub const HELLO_PAYLOAD: &[u8] = b"Hello World!";

/// Deadline for a single publish, including the broker confirmation.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// An opaque message body plus the content type it travelled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Message {
    /// Create a `text/plain` message.
    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            content_type: Some(CONTENT_TYPE.to_string()),
        }
    }

    /// Body rendered for logging; invalid UTF-8 is replaced, never rejected.
    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl From<Delivery> for Message {
    fn from(delivery: Delivery) -> Self {
        let content_type = delivery
            .properties
            .content_type()
            .as_ref()
            .map(|s| s.to_string());

        Self {
            body: delivery.data,
            content_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message() {
        let message = Message::text("ping");
        assert_eq!(message.body, b"ping");
        assert_eq!(message.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_body_lossy_replaces_invalid_utf8() {
        let message = Message::text(vec![b'o', b'k', 0xff]);
        assert_eq!(message.body_lossy(), "ok\u{fffd}");
    }
}
