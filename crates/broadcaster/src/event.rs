//! Events delivered to live room viewers.

use database::MessageView;
use serde::{Deserialize, Serialize};

/// A change to a room's visible conversation.
///
/// Serialized with a `type` tag: `message`, `message_edited` or
/// `message_deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A new turn was persisted.
    Message { message: MessageView },
    /// A turn's content was replaced.
    MessageEdited { message_id: i64, content: String },
    /// A turn was removed.
    MessageDeleted { message_id: i64 },
}

impl RoomEvent {
    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::Message { .. } => "message",
            RoomEvent::MessageEdited { .. } => "message_edited",
            RoomEvent::MessageDeleted { .. } => "message_deleted",
        }
    }

    /// Serialize for the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event_shape() {
        let event = RoomEvent::Message {
            message: MessageView {
                id: 7,
                room_id: 1,
                participant_id: 3,
                participant_name: "Alice".to_string(),
                participant_avatar: String::new(),
                content: "hi".to_string(),
                is_ai: true,
                created_at: "2026-01-01T00:00:00.000Z".to_string(),
            },
        };

        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["message"]["id"], 7);
        assert_eq!(value["message"]["participant_name"], "Alice");
        assert_eq!(value["message"]["is_ai"], true);
    }

    #[test]
    fn test_edit_and_delete_shapes() {
        let edited = RoomEvent::MessageEdited {
            message_id: 4,
            content: "fixed".to_string(),
        };
        assert_eq!(
            edited.to_json(),
            r#"{"type":"message_edited","message_id":4,"content":"fixed"}"#
        );
        assert_eq!(edited.kind(), "message_edited");

        let deleted = RoomEvent::MessageDeleted { message_id: 4 };
        assert_eq!(deleted.to_json(), r#"{"type":"message_deleted","message_id":4}"#);
    }
}
