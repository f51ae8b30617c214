use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a persisted conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }

    /// Whether a new message with this role counts as conversational activity.
    ///
    /// System messages are meta/context and do not bump session recency.
    pub fn bumps_recency(&self) -> bool {
        matches!(self, MessageRole::User | MessageRole::Assistant)
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            other => Err(format!("unknown message role: {}", other)),
        }
    }
}

/// Reference to an object in storage.
///
/// `key` is durable; `url` is a signed link that may have expired and has to
/// be regenerated before it is handed to the model or a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImage {
    pub url: String,
    pub key: String,
}

impl RemoteImage {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    fn is_usable(&self) -> bool {
        !self.url.is_empty() || !self.key.is_empty()
    }
}

/// A single turn as submitted by a client or read back for prompting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntry {
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_image: Option<RemoteImage>,
}

impl MessageEntry {
    pub fn text(role: MessageRole, prompt: impl Into<String>) -> Self {
        Self {
            role,
            prompt: Some(prompt.into()),
            remote_image: None,
        }
    }

    pub fn image(role: MessageRole, image: RemoteImage) -> Self {
        Self {
            role,
            prompt: None,
            remote_image: Some(image),
        }
    }

    pub fn with_image(mut self, image: RemoteImage) -> Self {
        self.remote_image = Some(image);
        self
    }

    /// Non-empty prompt text, if any
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.is_empty())
    }

    /// True when the entry carries text, an image, or both
    pub fn has_payload(&self) -> bool {
        self.prompt_text().is_some()
            || self.remote_image.as_ref().is_some_and(RemoteImage::is_usable)
    }
}
