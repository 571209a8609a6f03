//! Canonical messages ⇄ OpenAI chat-completions wire shape.
//!
//! The canonical model mirrors this format closely, so translation is mostly
//! field mapping. OpenAI has no flag for failed tool results; `is_error` does
//! not survive a trip through this format.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Message, Role, ToolCallRequest};

/// A chat-completions message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiMessage {
    pub role: String,
    /// Null for assistant turns that only request tools.
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Translate canonical messages into chat-completions messages.
pub fn to_vendor(messages: &[Message]) -> Vec<OpenAiMessage> {
    messages.iter().map(to_vendor_message).collect()
}

fn to_vendor_message(message: &Message) -> OpenAiMessage {
    let content = if message.content.is_empty() && message.has_tool_calls() {
        None
    } else {
        Some(message.content.clone())
    };
    OpenAiMessage {
        role: message.role.as_str().to_string(),
        content,
        tool_calls: message.tool_calls.clone().filter(|calls| !calls.is_empty()),
        tool_call_id: message.tool_call_id.clone(),
    }
}

/// Translate one chat-completions message back into the canonical model.
pub fn from_vendor(message: &OpenAiMessage) -> Result<Message> {
    let role: Role = message.role.parse()?;
    Ok(Message {
        role,
        content: message.content.clone().unwrap_or_default(),
        tool_call_id: message.tool_call_id.clone(),
        tool_calls: message.tool_calls.clone().filter(|calls| !calls.is_empty()),
        is_error: None,
    })
}
