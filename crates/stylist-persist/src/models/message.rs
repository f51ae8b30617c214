use serde::{Deserialize, Serialize};
use stylist_types::{MessageEntry, MessageRole, RemoteImage};

/// Database-agnostic message model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: Option<String>,
    pub remote_image: Option<RemoteImage>,
    pub created_at: i64,
}

impl StoredMessage {
    /// View of this row in the shape the prompt builder consumes
    pub fn to_entry(&self) -> MessageEntry {
        MessageEntry {
            role: self.role,
            prompt: self.content.clone(),
            remote_image: self.remote_image.clone(),
        }
    }
}

/// Message appended to an existing session
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: String,
    pub role: MessageRole,
    pub content: Option<String>,
    pub remote_image: Option<RemoteImage>,
}

impl NewMessage {
    pub fn new(session_id: impl Into<String>, entry: MessageEntry) -> Self {
        Self {
            session_id: session_id.into(),
            role: entry.role,
            content: entry.prompt,
            remote_image: entry.remote_image,
        }
    }

    pub fn assistant_text(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(session_id, MessageEntry::text(MessageRole::Assistant, text))
    }

    pub(crate) fn as_entry(&self) -> MessageEntry {
        MessageEntry {
            role: self.role,
            prompt: self.content.clone(),
            remote_image: self.remote_image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stored_message_wire_shape() {
        let message = StoredMessage {
            id: "m1".to_string(),
            session_id: "s1".to_string(),
            role: MessageRole::User,
            content: None,
            remote_image: Some(RemoteImage::new("https://img.example/a.jpg", "a.jpg")),
            created_at: 1_700_000_000_000,
        };

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "id": "m1",
                "sessionId": "s1",
                "role": "user",
                "content": null,
                "remoteImage": {"url": "https://img.example/a.jpg", "key": "a.jpg"},
                "createdAt": 1_700_000_000_000i64
            })
        );
    }

    #[test]
    fn test_entry_view_keeps_payload() {
        let new = NewMessage::assistant_text("s1", "Try loafers");
        let entry = new.as_entry();
        assert_eq!(entry.role, MessageRole::Assistant);
        assert_eq!(entry.prompt_text(), Some("Try loafers"));
    }
}
