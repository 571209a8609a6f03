//! Canonical messages ⇄ Anthropic Messages API wire shape.
//!
//! Anthropic has no inline `system` role and wants every set of tool outputs
//! answered in a single user turn, so system messages are lifted into an
//! out-of-band instruction and adjacent tool results are coalesced.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ChatError, Result};
use crate::types::{Message, Role, ToolCallRequest};

/// A message in Anthropic's wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: AnthropicContent,
}

/// Message content: a bare string or a list of typed blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnthropicContent {
    Text(String),
    Blocks(Vec<AnthropicContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: ToolResultContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Any block type this crate does not model (images, thinking, ...).
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ToolResultBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultBlock {
    Text { text: String },
}

impl ToolResultContent {
    fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .map(|ToolResultBlock::Text { text }| text.as_str())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// The translated conversation: out-of-band system instruction plus turns.
#[derive(Debug, Clone, PartialEq)]
pub struct AnthropicPrompt {
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
}

/// Translate canonical messages into an Anthropic prompt.
pub fn to_vendor(messages: &[Message]) -> Result<AnthropicPrompt> {
    let system_parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n"));

    let mut out = Vec::new();
    let mut pending_results: Vec<&Message> = Vec::new();

    for message in messages.iter().filter(|m| m.role != Role::System) {
        if message.role == Role::Tool {
            pending_results.push(message);
            continue;
        }
        if !pending_results.is_empty() {
            out.push(tool_results_turn(&pending_results)?);
            pending_results.clear();
        }
        out.push(match message.role {
            Role::User => AnthropicMessage {
                role: "user".into(),
                content: AnthropicContent::Text(message.content.clone()),
            },
            Role::Assistant => assistant_turn(message),
            other => return Err(ChatError::UnknownRole(other.to_string())),
        });
    }
    if !pending_results.is_empty() {
        out.push(tool_results_turn(&pending_results)?);
    }

    Ok(AnthropicPrompt {
        system,
        messages: out,
    })
}

fn assistant_turn(message: &Message) -> AnthropicMessage {
    let mut blocks = Vec::new();
    if !message.content.trim().is_empty() {
        blocks.push(AnthropicContentBlock::Text {
            text: message.content.clone(),
        });
    }
    for call in message.tool_calls() {
        let input = match serde_json::from_str::<Value>(&call.arguments_json) {
            Ok(value) => value,
            Err(err) => {
                // the loop already answered this call with a parse error
                warn!(
                    tool_call_id = %call.id,
                    error = %err,
                    "sending unparseable tool arguments to Anthropic as an empty object"
                );
                Value::Object(Default::default())
            }
        };
        blocks.push(AnthropicContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.function_name.clone(),
            input,
        });
    }

    let content = if blocks.is_empty() {
        AnthropicContent::Text(message.content.clone())
    } else {
        AnthropicContent::Blocks(blocks)
    };
    AnthropicMessage {
        role: "assistant".into(),
        content,
    }
}

fn tool_results_turn(results: &[&Message]) -> Result<AnthropicMessage> {
    let blocks = results
        .iter()
        .map(|message| {
            let tool_use_id = message.tool_call_id.clone().ok_or_else(|| {
                ChatError::InvalidArgument("tool message must have a tool_call_id".into())
            })?;
            Ok(AnthropicContentBlock::ToolResult {
                tool_use_id,
                content: ToolResultContent::Blocks(vec![ToolResultBlock::Text {
                    text: message.content.clone(),
                }]),
                is_error: message.is_error,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnthropicMessage {
        role: "user".into(),
        content: AnthropicContent::Blocks(blocks),
    })
}

/// Translate one Anthropic turn back into canonical messages.
///
/// A coalesced tool-results turn expands to one `tool` message per result.
pub fn from_vendor(message: &AnthropicMessage) -> Result<Vec<Message>> {
    match message.role.as_str() {
        "user" => user_messages(&message.content),
        "assistant" => Ok(vec![assistant_message(&message.content)?]),
        other => Err(ChatError::UnknownRole(other.to_string())),
    }
}

fn user_messages(content: &AnthropicContent) -> Result<Vec<Message>> {
    let blocks = match content {
        AnthropicContent::Text(text) => return Ok(vec![Message::user(text.clone())]),
        AnthropicContent::Blocks(blocks) => blocks,
    };

    blocks
        .iter()
        .map(|block| match block {
            AnthropicContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => Ok(Message {
                role: Role::Tool,
                content: content.text(),
                tool_call_id: Some(tool_use_id.clone()),
                tool_calls: None,
                is_error: *is_error,
            }),
            AnthropicContentBlock::Text { text } => Ok(Message::user(text.clone())),
            other => Err(unknown_block("user", other)),
        })
        .collect()
}

fn assistant_message(content: &AnthropicContent) -> Result<Message> {
    let blocks = match content {
        AnthropicContent::Text(text) => return Ok(Message::assistant(text.clone())),
        AnthropicContent::Blocks(blocks) => blocks,
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in blocks {
        match block {
            AnthropicContentBlock::Text { text: part } => text.push_str(part),
            AnthropicContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCallRequest::new(id.clone(), name.clone(), input.to_string()));
            }
            other => return Err(unknown_block("assistant", other)),
        }
    }

    Ok(Message::assistant_with_tool_calls(text, tool_calls))
}

fn unknown_block(role: &str, block: &AnthropicContentBlock) -> ChatError {
    let kind = match block {
        AnthropicContentBlock::Text { .. } => "text",
        AnthropicContentBlock::ToolUse { .. } => "tool_use",
        AnthropicContentBlock::ToolResult { .. } => "tool_result",
        AnthropicContentBlock::Unsupported => "unsupported",
    };
    ChatError::UnknownContentBlock(format!("{kind} block in {role} message"))
}
