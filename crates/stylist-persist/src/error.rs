use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Caller input is incomplete or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown id, wrong owner or already deleted; callers cannot tell which
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row that no longer decodes into a domain value
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
