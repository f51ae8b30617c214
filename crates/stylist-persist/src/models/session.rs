use serde::{Deserialize, Serialize};
use stylist_types::{MessageEntry, RemoteImage};

/// Database-agnostic session model.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub thumbnail_image_url: Option<String>,
    pub thumbnail_image_key: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
    pub is_deleted: bool,
}

impl Session {
    pub fn thumbnail(&self) -> Option<RemoteImage> {
        match (&self.thumbnail_image_url, &self.thumbnail_image_key) {
            (None, None) => None,
            (url, key) => Some(RemoteImage::new(
                url.clone().unwrap_or_default(),
                key.clone().unwrap_or_default(),
            )),
        }
    }
}

/// Input for creating a session together with its opening messages
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub title: Option<String>,
    pub messages: Vec<MessageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    pub session_id: String,
    pub title: String,
    pub message_ids: Vec<String>,
}
