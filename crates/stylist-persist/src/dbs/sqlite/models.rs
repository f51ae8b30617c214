use sqlx::FromRow;
use stylist_types::{MessageRole, RemoteImage};

use crate::error::StoreError;
use crate::models::{Session, StoredMessage};

/// Row of `style_analysis_histories`
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
    pub is_deleted: bool,
}

/// Row of `style_analysis_entries`
#[derive(Debug, Clone, FromRow)]
pub struct EntryRow {
    pub id: String,
    pub style_analysis_history_id: String,
    pub role: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    pub created_at: i64,
}

// Conversions between SQLite rows and database-agnostic models

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            thumbnail_image_url: row.image_url,
            thumbnail_image_key: row.image_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            is_deleted: row.is_deleted,
        }
    }
}

impl TryFrom<EntryRow> for StoredMessage {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let role: MessageRole = row
            .role
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("entry {}: {}", row.id, e)))?;

        let remote_image = match (row.image_url, row.image_key) {
            (None, None) => None,
            (url, key) => Some(RemoteImage::new(url.unwrap_or_default(), key.unwrap_or_default())),
        };

        Ok(Self {
            id: row.id,
            session_id: row.style_analysis_history_id,
            role,
            content: row.content,
            remote_image,
            created_at: row.created_at,
        })
    }
}
