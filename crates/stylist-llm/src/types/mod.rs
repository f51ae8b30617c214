pub mod input;
pub mod output;

pub use input::{InputContent, InputItem, LLMInput, LLMRole};
pub use output::{OutputContent, OutputItem, ResponsesResponse};
