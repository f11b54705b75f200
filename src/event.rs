//! Event model and wire shapes (spec §3).

use serde::{Deserialize, Serialize};

/// Build the routing key `topic + "." + operation` used for dispatch.
pub(crate) fn build_event_code(topic: &str, operation: &str) -> String {
    format!("{topic}.{operation}")
}

/// A decrypted, immutable inbound event.
#[derive(Debug, Clone)]
pub struct Event {
    pub topic: String,
    pub operation: String,
    pub time: i64,
    pub data: String,
    pub event_code: String,
}

impl Event {
    pub(crate) fn new(topic: String, operation: String, time: i64, data: String) -> Self {
        let event_code = build_event_code(&topic, &operation);
        Self {
            topic,
            operation,
            time,
            data,
            event_code,
        }
    }
}

/// An [`Event`] with its `data` field parsed as JSON into `T`.
#[derive(Debug, Clone)]
pub struct TypedEvent<T> {
    pub event: Event,
    pub parsed_data: T,
}

impl<T> std::ops::Deref for TypedEvent<T> {
    type Target = Event;

    fn deref(&self) -> &Event {
        &self.event
    }
}

/// Tag-probing record used to sniff an inbound frame's shape before
/// committing to a full decode (spec §4.6 step 1).
#[derive(Debug, Deserialize)]
pub(crate) struct FrameTag {
    #[serde(default)]
    pub(crate) r#type: Option<String>,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) operation: Option<String>,
}

/// An inbound event frame, as received on the socket.
#[derive(Debug, Deserialize)]
pub(crate) struct EventMessage {
    pub(crate) topic: String,
    pub(crate) operation: String,
    pub(crate) time: i64,
    pub(crate) nonce: String,
    pub(crate) signature: String,
    pub(crate) encrypted_data: String,
}

/// Reason the server gave for a GoAway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum GoAwayReason {
    ServerShutdown,
    ConnectionReplaced,
    HeartbeatTimeout,
}

/// Server-initiated connection teardown notification.
#[derive(Debug, Deserialize)]
pub(crate) struct GoAwayMessage {
    pub(crate) reason: GoAwayReason,
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) reconnect_ms: Option<u64>,
}

/// Outbound at-least-once acknowledgement for a delivered event.
#[derive(Debug, Serialize)]
pub(crate) struct AckMessage {
    pub(crate) r#type: &'static str,
    pub(crate) nonce: String,
    pub(crate) code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) msg: Option<String>,
}

impl AckMessage {
    pub(crate) fn ok(nonce: String) -> Self {
        Self {
            r#type: "ack",
            nonce,
            code: 200,
            msg: None,
        }
    }

    /// Error ACK; `msg` is truncated to 256 bytes (on a UTF-8 char boundary)
    /// with a trailing `"..."` marker when it exceeds that length.
    pub(crate) fn error(nonce: String, msg: String) -> Self {
        let msg = if msg.len() > 256 {
            let mut cut = 256;
            while !msg.is_char_boundary(cut) {
                cut -= 1;
            }
            let mut truncated = msg[..cut].to_string();
            truncated.push_str("...");
            truncated
        } else {
            msg
        };
        Self {
            r#type: "ack",
            nonce,
            code: 500,
            msg: Some(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_code_construction() {
        assert_eq!(
            build_event_code("kso.app_chat.message", "create"),
            "kso.app_chat.message.create"
        );
        assert_eq!(
            build_event_code("kso.xz.app.group_chat", "delete"),
            "kso.xz.app.group_chat.delete"
        );
    }

    #[test]
    fn ack_error_truncates_long_message() {
        let long = "x".repeat(300);
        let ack = AckMessage::error("n".to_string(), long);
        let msg = ack.msg.unwrap();
        assert!(msg.ends_with("..."));
        assert_eq!(msg.len(), 259);
    }

    #[test]
    fn ack_error_truncates_multibyte_message_on_char_boundary() {
        let long = "你".repeat(300);
        let ack = AckMessage::error("n".to_string(), long);
        let msg = ack.msg.unwrap();
        assert!(msg.ends_with("..."));
        // "你" is 3 bytes; the truncated body must stay within the 256-byte
        // budget, landing on a char boundary rather than splitting a
        // multi-byte character.
        assert!(msg.len() - 3 <= 256);
        assert_eq!(msg.len() - 3, 255);
    }

    #[test]
    fn ack_error_leaves_short_message_untouched() {
        let ack = AckMessage::error("n".to_string(), "oops".to_string());
        assert_eq!(ack.msg.as_deref(), Some("oops"));
    }

    #[test]
    fn goaway_reason_parses_snake_case() {
        let msg: GoAwayMessage =
            serde_json::from_str(r#"{"reason":"connection_replaced","message":"bye"}"#).unwrap();
        assert_eq!(msg.reason, GoAwayReason::ConnectionReplaced);
        assert_eq!(msg.reconnect_ms, None);
    }
}
