use serde::{Deserialize, Serialize};

/// Roles accepted by the Responses API input list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMRole {
    User,
    Developer,
    Assistant,
}

/// One role-tagged entry of the model input.
///
/// Request-scoped only; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMInput {
    pub role: LLMRole,
    pub content: InputContent,
}

/// Content is either a bare string or an ordered list of typed items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputContent {
    Text(String),
    Items(Vec<InputItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    InputText { text: String },
    InputImage { image_url: String },
}

impl LLMInput {
    pub fn new(role: LLMRole, content: InputContent) -> Self {
        Self { role, content }
    }

    /// Plain-text user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(LLMRole::User, InputContent::Text(text.into()))
    }

    /// User turn made of typed items (text and/or image)
    pub fn user_items(items: Vec<InputItem>) -> Self {
        Self::new(LLMRole::User, InputContent::Items(items))
    }

    pub fn developer(text: impl Into<String>) -> Self {
        Self::new(LLMRole::Developer, InputContent::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(LLMRole::Assistant, InputContent::Text(text.into()))
    }
}

impl InputItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::InputText { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::InputImage { image_url: url.into() }
    }
}
