use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    /// Provider answered with a non-2xx status
    #[error("LLM API error ({status}): {body}")]
    Request { status: u16, body: String },

    #[error("LLM transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM stream error: {0}")]
    Stream(String),

    #[error("Failed to decode LLM response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Cancelled before a response arrived
    #[error("LLM request cancelled")]
    Cancelled,

    /// Cancelled while the response was streaming
    #[error("LLM stream aborted")]
    Aborted,
}

impl LLMError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, LLMError::Cancelled | LLMError::Aborted)
    }
}

pub type Result<T> = std::result::Result<T, LLMError>;
