//! Message translators between the canonical model and vendor wire formats.

pub mod anthropic;
pub mod openai;

pub use anthropic::{AnthropicMessage, AnthropicPrompt};
pub use openai::OpenAiMessage;
