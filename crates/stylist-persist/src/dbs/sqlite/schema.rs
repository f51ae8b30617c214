use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS style_analysis_histories (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        image_url TEXT,
        image_key TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        deleted_at INTEGER,
        is_deleted INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_histories_user_recency
        ON style_analysis_histories (user_id, is_deleted, updated_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS style_analysis_entries (
        id TEXT PRIMARY KEY,
        style_analysis_history_id TEXT NOT NULL
            REFERENCES style_analysis_histories (id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
        content TEXT,
        image_url TEXT,
        image_key TEXT,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_entries_history_created
        ON style_analysis_entries (style_analysis_history_id, created_at)
    "#,
];

/// Create tables and indexes if they are missing. Existing tables are left alone.
pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
