use std::sync::Arc;
use std::time::Duration;

use stylist_types::{MessageEntry, DEFAULT_SESSION_TITLE};
use tokio_util::sync::CancellationToken;

use crate::error::LLMError;
use crate::traits::LLMClient;
use crate::types::LLMInput;

#[derive(Debug, Clone)]
pub struct TitleOptions {
    /// Word limit given to the model (a hint, not enforced)
    pub max_words: usize,
    /// Hard character limit applied during sanitization
    pub max_length: usize,
    pub timeout: Duration,
}

impl Default for TitleOptions {
    fn default() -> Self {
        Self {
            max_words: 6,
            max_length: 60,
            timeout: Duration::from_millis(5000),
        }
    }
}

impl TitleOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One-shot model call that names a session.
///
/// Every failure mode (timeout, provider error, unusable output) yields
/// `None`; nothing is propagated to the caller.
pub struct TitleGenerator {
    client: Arc<dyn LLMClient>,
}

impl TitleGenerator {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    pub async fn generate(&self, messages: &[MessageEntry], options: &TitleOptions) -> Option<String> {
        let summary = summarize_messages(messages);
        if summary.is_empty() {
            return None;
        }

        let prompt = vec![LLMInput::user(format!(
            "Create a concise session title (max {} words) for a personal-stylist style analysis based on the messages below. Return only the title in Title Case.\n\n{}\n\nTitle:",
            options.max_words, summary
        ))];

        let cancel = CancellationToken::new();
        let request = self.client.generate_response(prompt, Some(cancel.clone()));

        let outputs = match tokio::time::timeout(options.timeout, request).await {
            Ok(Ok(outputs)) => outputs,
            Ok(Err(LLMError::Cancelled)) => {
                tracing::warn!("Title generation request was cancelled");
                return None;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Title generation failed");
                return None;
            }
            Err(_) => {
                cancel.cancel();
                tracing::warn!(
                    timeout_ms = options.timeout.as_millis() as u64,
                    "Title generation timed out"
                );
                return None;
            }
        };

        let candidate = outputs.iter().find_map(|o| o.as_output_text())?;
        sanitize_title(candidate, options.max_length)
    }
}

/// Numbered plain-text rendering of every entry that carries text or an image
pub fn summarize_messages(messages: &[MessageEntry]) -> String {
    messages
        .iter()
        .filter_map(|m| {
            let content = match (m.prompt_text(), &m.remote_image) {
                (Some(text), _) => text.to_string(),
                (None, Some(image)) => format!("[image] {}", image.url),
                (None, None) => return None,
            };
            Some((m.role, content))
        })
        .enumerate()
        .map(|(i, (role, content))| format!("{}. {}: {}", i + 1, role, content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First line only, whitespace collapsed, clipped to `max_length` characters.
///
/// Empty results and the default placeholder title are rejected.
pub fn sanitize_title(raw: &str, max_length: usize) -> Option<String> {
    let first_line = raw.split('\n').next().unwrap_or_default();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    let clipped: String = collapsed.chars().take(max_length).collect();
    let clipped = clipped.trim();

    if clipped.is_empty() || clipped.eq_ignore_ascii_case(DEFAULT_SESSION_TITLE) {
        return None;
    }

    Some(clipped.to_string())
}
