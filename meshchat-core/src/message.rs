//! Timeline message types.
//!
//! Messages are stored per surface in the [`AppState`](crate::state::AppState)
//! timelines and rendered by the front-end. Command feedback is appended as
//! [`MessageOrigin::System`] messages.

use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

/// Sender name used for locally generated feedback.
pub const SYSTEM_SENDER: &str = "system";

/// Unique identifier for a message, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new time-ordered message identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a timeline entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Locally generated command feedback.
    System,
    /// Sent by the local user and echoed into the timeline.
    Outgoing,
    /// Received from a peer.
    Incoming,
}

/// A single timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Display name of the sender.
    pub sender: String,
    /// Message text.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Origin of the message.
    pub origin: MessageOrigin,
}

impl ChatMessage {
    /// Creates a system feedback message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: SYSTEM_SENDER.to_string(),
            content: content.into(),
            timestamp: Utc::now(),
            origin: MessageOrigin::System,
        }
    }

    /// Creates a local echo of a message the user sent.
    ///
    /// The id should match the one handed to the outbound port so delivery
    /// updates can be correlated.
    #[must_use]
    pub fn outgoing(id: MessageId, sender: &str, content: impl Into<String>) -> Self {
        Self {
            id,
            sender: sender.to_string(),
            content: content.into(),
            timestamp: Utc::now(),
            origin: MessageOrigin::Outgoing,
        }
    }

    /// Creates a message received from a peer.
    #[must_use]
    pub fn incoming(sender: &str, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: sender.to_string(),
            content: content.into(),
            timestamp: Utc::now(),
            origin: MessageOrigin::Incoming,
        }
    }

    /// Returns `true` for locally generated command feedback.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.origin == MessageOrigin::System
    }

    /// Formats the timestamp in local time with a chrono format string.
    #[must_use]
    pub fn format_timestamp(&self, format: &str) -> String {
        self.timestamp.with_timezone(&Local).format(format).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_uses_system_sender() {
        let msg = ChatMessage::system("joined channel #rust");
        assert_eq!(msg.sender, SYSTEM_SENDER);
        assert!(msg.is_system());
        assert_eq!(msg.content, "joined channel #rust");
    }

    #[test]
    fn outgoing_keeps_supplied_id() {
        let id = MessageId::new();
        let msg = ChatMessage::outgoing(id, "alice", "hi");
        assert_eq!(msg.id, id);
        assert_eq!(msg.origin, MessageOrigin::Outgoing);
        assert!(!msg.is_system());
    }

    #[test]
    fn message_ids_are_unique() {
        assert_ne!(MessageId::new(), MessageId::new());
    }

    #[test]
    fn timestamp_formats_with_pattern() {
        let msg = ChatMessage::incoming("bob", "hey");
        let formatted = msg.format_timestamp("%H:%M");
        assert_eq!(formatted.len(), 5);
        assert_eq!(formatted.as_bytes()[2], b':');
    }
}
