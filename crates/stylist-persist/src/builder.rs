use crate::dbs::sqlite::SqliteSessionStore;
use crate::error::{Result, StoreError};

pub struct SessionStoreBuilder {
    database_url: Option<String>,
    max_connections: u32,
}

impl SessionStoreBuilder {
    pub fn new() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
        }
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub async fn build(self) -> Result<SqliteSessionStore> {
        let database_url = self
            .database_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| StoreError::validation("database_url is required"))?;

        tracing::info!(
            max_connections = self.max_connections,
            "Connecting session store"
        );

        SqliteSessionStore::connect(&database_url, self.max_connections).await
    }
}

impl Default for SessionStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
