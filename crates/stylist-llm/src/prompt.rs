use std::sync::Arc;

use stylist_types::{MessageEntry, MessageRole, UrlRefresher};

use crate::types::{InputItem, LLMInput};

/// Turns a stored conversation into Responses API input.
///
/// System prompts are never sent as-is. They are buffered, and the next user
/// answer is folded together with the most recent one into a single developer
/// message. Image URLs are re-signed right before inclusion because stored
/// links may have expired.
pub struct PromptBuilder {
    refresher: Arc<dyn UrlRefresher>,
}

impl PromptBuilder {
    pub fn new(refresher: Arc<dyn UrlRefresher>) -> Self {
        Self { refresher }
    }

    pub async fn prepare_messages(&self, messages: &[MessageEntry]) -> Vec<LLMInput> {
        let mut prepared = Vec::with_capacity(messages.len());
        let mut system_prompts: Vec<&str> = Vec::new();

        for (i, message) in messages.iter().enumerate() {
            match message.role {
                MessageRole::System => {
                    if let Some(prompt) = message.prompt_text() {
                        system_prompts.push(prompt);
                    }
                }
                MessageRole::User => match system_prompts.last().copied() {
                    Some(last_system_prompt) if i > 0 => {
                        let answer = message.prompt_text().unwrap_or_default();
                        prepared.push(LLMInput::developer(developer_fold(last_system_prompt, answer)));
                        system_prompts.clear();
                    }
                    _ => prepared.push(self.user_input(message).await),
                },
                MessageRole::Assistant => {
                    // Image-only assistant turns carry nothing the model can use
                    if let Some(text) = message.prompt_text() {
                        prepared.push(LLMInput::assistant(text));
                    }
                }
            }
        }

        prepared
    }

    async fn user_input(&self, message: &MessageEntry) -> LLMInput {
        let mut items = Vec::with_capacity(2);

        if let Some(text) = message.prompt_text() {
            items.push(InputItem::text(text));
        }

        if let Some(image) = &message.remote_image {
            let fresh_url = self.refresher.refresh_url(&image.url).await;
            items.push(InputItem::image(fresh_url));
        }

        LLMInput::user_items(items)
    }
}

fn developer_fold(system_prompt: &str, answer: &str) -> String {
    format!(
        "Here is the response to \"{}\": {}. Use that information and talk like a personal stylist.",
        system_prompt, answer
    )
}
