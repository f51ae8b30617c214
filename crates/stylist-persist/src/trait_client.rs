use async_trait::async_trait;
use stylist_types::Page;

use crate::error::Result;
use crate::models::{CreatedSession, NewMessage, NewSession, Session, StoredMessage};

/// Trait for session persistence operations
///
/// Implementations provide database-specific storage for sessions and their
/// message entries. "Not found" and "not owned by this user" are deliberately
/// the same outcome everywhere.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session and all of its opening messages with one shared timestamp
    async fn create_session_with_initial_message(&self, session: NewSession) -> Result<CreatedSession>;

    /// Append a message; user and assistant messages bump the session's `updated_at`
    async fn add_message(&self, message: NewMessage) -> Result<String>;

    /// Live (not soft-deleted) session owned by `user_id`
    async fn get_session(&self, session_id: &str, user_id: &str) -> Result<Option<Session>>;

    /// Whether the row exists for this owner, regardless of soft deletion
    async fn session_exists(&self, session_id: &str, user_id: &str) -> Result<bool>;

    /// One page of a session's messages, oldest first. Does not check ownership.
    async fn get_session_messages(
        &self,
        session_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<StoredMessage>>;

    /// Every message of a session, oldest first. Does not check ownership.
    async fn list_all_session_messages(&self, session_id: &str) -> Result<Vec<StoredMessage>>;

    /// One page of a user's live, non-empty sessions, most recently active first
    async fn get_user_sessions(&self, user_id: &str, page: u32, page_size: u32) -> Result<Page<Session>>;

    async fn soft_delete_session(&self, session_id: &str, user_id: &str) -> Result<()>;

    /// Remove the session and its messages permanently
    async fn hard_delete_session(&self, session_id: &str, user_id: &str) -> Result<()>;

    async fn update_session_title(&self, session_id: &str, title: &str) -> Result<()>;

    /// Cheap round trip used by health checks
    async fn ping(&self) -> Result<()>;
}
