use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use stylist_types::{MessageEntry, Page, Pagination, DEFAULT_SESSION_TITLE};
use uuid::Uuid;

use crate::clock::MonotonicClock;
use crate::dbs::sqlite::models::{EntryRow, SessionRow};
use crate::dbs::sqlite::schema::ensure_schema;
use crate::error::{Result, StoreError};
use crate::models::{CreatedSession, NewMessage, NewSession, Session, StoredMessage};
use crate::trait_client::SessionStore;
use crate::validation::{validate_new_session, validate_page};

const SESSION_COLUMNS: &str =
    "id, user_id, title, image_url, image_key, created_at, updated_at, deleted_at, is_deleted";
const ENTRY_COLUMNS: &str =
    "id, style_analysis_history_id, role, content, image_url, image_key, created_at";

/// [`SessionStore`] backed by a SQLite pool
pub struct SqliteSessionStore {
    pool: SqlitePool,
    clock: MonotonicClock,
}

impl SqliteSessionStore {
    /// Open (creating if needed) the database at `url` and ensure the schema
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database, mainly for tests.
    ///
    /// Pinned to one connection that is never recycled; every new connection
    /// to `:memory:` would otherwise see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        ensure_schema(&pool).await?;
        Ok(Self {
            pool,
            clock: MonotonicClock::new(),
        })
    }
}

async fn insert_entry<'e, E>(
    executor: E,
    id: &str,
    session_id: &str,
    entry: &MessageEntry,
    created_at: i64,
) -> sqlx::Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let image = entry.remote_image.as_ref();

    sqlx::query(
        r#"
        INSERT INTO style_analysis_entries
            (id, style_analysis_history_id, role, content, image_url, image_key, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(session_id)
    .bind(entry.role.as_str())
    .bind(entry.prompt_text())
    .bind(image.and_then(|i| non_empty(&i.url)))
    .bind(image.and_then(|i| non_empty(&i.key)))
    .bind(created_at)
    .execute(executor)
    .await?;

    Ok(())
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn missing_session(err: sqlx::Error, session_id: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::not_found(format!("Session {} not found", session_id))
        }
        _ => err.into(),
    }
}

fn limit_offset(page: u32, page_size: u32) -> (i64, i64) {
    let offset = i64::try_from(Pagination::offset(page, page_size)).unwrap_or(i64::MAX);
    (i64::from(page_size), offset)
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create_session_with_initial_message(&self, session: NewSession) -> Result<CreatedSession> {
        validate_new_session(&session)?;

        let session_id = Uuid::new_v4().to_string();
        let now = self.clock.now_millis();
        let title = session
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());

        // Thumbnail comes from the first message with an image, whatever its role
        let thumbnail = session.messages.iter().find_map(|m| m.remote_image.as_ref());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO style_analysis_histories
                (id, user_id, title, image_url, image_key, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session_id)
        .bind(&session.user_id)
        .bind(&title)
        .bind(thumbnail.and_then(|i| non_empty(&i.url)))
        .bind(thumbnail.and_then(|i| non_empty(&i.key)))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut message_ids = Vec::with_capacity(session.messages.len());
        for message in &session.messages {
            let message_id = Uuid::new_v4().to_string();
            insert_entry(&mut *tx, &message_id, &session_id, message, now).await?;
            message_ids.push(message_id);
        }

        tx.commit().await?;

        tracing::debug!(
            session_id = %session_id,
            messages = message_ids.len(),
            "Created style analysis session"
        );

        Ok(CreatedSession {
            session_id,
            title,
            message_ids,
        })
    }

    async fn add_message(&self, message: NewMessage) -> Result<String> {
        let entry = message.as_entry();
        if !entry.has_payload() {
            return Err(StoreError::validation("Either content or remoteImage is required"));
        }

        let message_id = Uuid::new_v4().to_string();
        let now = self.clock.now_millis();

        let mut tx = self.pool.begin().await?;

        insert_entry(&mut *tx, &message_id, &message.session_id, &entry, now)
            .await
            .map_err(|e| missing_session(e, &message.session_id))?;

        if message.role.bumps_recency() {
            sqlx::query("UPDATE style_analysis_histories SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(&message.session_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(message_id)
    }

    async fn get_session(&self, session_id: &str, user_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM style_analysis_histories WHERE id = ? AND user_id = ? AND is_deleted = 0",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    async fn session_exists(&self, session_id: &str, user_id: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM style_analysis_histories WHERE id = ? AND user_id = ?",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn get_session_messages(
        &self,
        session_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<StoredMessage>> {
        validate_page(page, page_size)?;
        let (limit, offset) = limit_offset(page, page_size);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM style_analysis_entries WHERE style_analysis_history_id = ?",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {} FROM style_analysis_entries
            WHERE style_analysis_history_id = ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT ? OFFSET ?
            "#,
            ENTRY_COLUMNS
        ))
        .bind(session_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(StoredMessage::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, page, page_size, total.max(0) as u64))
    }

    async fn list_all_session_messages(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {} FROM style_analysis_entries
            WHERE style_analysis_history_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
            ENTRY_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredMessage::try_from).collect()
    }

    async fn get_user_sessions(&self, user_id: &str, page: u32, page_size: u32) -> Result<Page<Session>> {
        validate_page(page, page_size)?;
        let (limit, offset) = limit_offset(page, page_size);

        const VISIBLE: &str = r#"
            h.user_id = ?
            AND h.is_deleted = 0
            AND EXISTS (
                SELECT 1 FROM style_analysis_entries e
                WHERE e.style_analysis_history_id = h.id
            )
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM style_analysis_histories h WHERE {}",
            VISIBLE
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let columns = SESSION_COLUMNS
            .split(", ")
            .map(|c| format!("h.{}", c))
            .collect::<Vec<_>>()
            .join(", ");

        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {} FROM style_analysis_histories h
            WHERE {}
            ORDER BY h.updated_at DESC, h.rowid DESC
            LIMIT ? OFFSET ?
            "#,
            columns, VISIBLE
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.into_iter().map(Session::from).collect();
        Ok(Page::new(items, page, page_size, total.max(0) as u64))
    }

    async fn soft_delete_session(&self, session_id: &str, user_id: &str) -> Result<()> {
        let now = self.clock.now_millis();

        // Conditional on is_deleted = 0 so concurrent deletes cannot both succeed
        let result = sqlx::query(
            r#"
            UPDATE style_analysis_histories
            SET is_deleted = 1, deleted_at = ?, updated_at = ?
            WHERE id = ? AND user_id = ? AND is_deleted = 0
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Session not found or already deleted"));
        }

        tracing::info!(session_id = %session_id, "Session soft-deleted");
        Ok(())
    }

    async fn hard_delete_session(&self, session_id: &str, user_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM style_analysis_entries
            WHERE style_analysis_history_id IN (
                SELECT id FROM style_analysis_histories WHERE id = ? AND user_id = ?
            )
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM style_analysis_histories WHERE id = ? AND user_id = ?")
            .bind(session_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Session not found"));
        }

        tx.commit().await?;

        tracing::info!(session_id = %session_id, "Session hard-deleted");
        Ok(())
    }

    async fn update_session_title(&self, session_id: &str, title: &str) -> Result<()> {
        let now = self.clock.now_millis();

        let result = sqlx::query(
            "UPDATE style_analysis_histories SET title = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(now)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Session not found"));
        }

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
