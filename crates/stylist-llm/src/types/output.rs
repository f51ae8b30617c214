// Responses API output payloads
// https://platform.openai.com/docs/api-reference/responses

use serde::Deserialize;

/// Non-streaming response from `/responses`.
///
/// Only the output array is modelled; everything else the provider sends is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

/// Item in the output array. Anything that is not a message is a no-op.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Other,
}

/// Content item inside a message output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText {
        text: String,
        #[serde(default)]
        annotations: Vec<serde_json::Value>,
    },
    Refusal {
        refusal: String,
    },
    #[serde(other)]
    Other,
}

impl OutputContent {
    pub fn output_text(text: impl Into<String>) -> Self {
        Self::OutputText {
            text: text.into(),
            annotations: Vec::new(),
        }
    }

    pub fn as_output_text(&self) -> Option<&str> {
        match self {
            Self::OutputText { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl ResponsesResponse {
    /// Content of every `message` output, concatenated in order and flattened
    pub fn into_message_content(self) -> Vec<OutputContent> {
        self.output
            .into_iter()
            .flat_map(|item| match item {
                OutputItem::Message { content } => content,
                OutputItem::Other => Vec::new(),
            })
            .collect()
    }
}
