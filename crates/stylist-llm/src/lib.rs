pub mod types;
pub mod error;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;
pub mod prompt;
pub mod title;

pub use error::LLMError;
pub use traits::{completion_handler, CompletionHandler, LLMClient, TextStream};
pub use streaming::{spawn_text_pipeline, ResponseEventParser, ResponseStreamRecord};
pub use buffer_utils::{CircularLineBuffer, SseEvent, SseLineParser};
pub use openai::{ResponsesClient, ResponsesConfig};
pub use prompt::PromptBuilder;
pub use title::{sanitize_title, summarize_messages, TitleGenerator, TitleOptions};
pub use types::{InputContent, InputItem, LLMInput, LLMRole, OutputContent, OutputItem, ResponsesResponse};

pub use tokio_util::sync::CancellationToken;
