//! Anthropic Messages streaming events → canonical stream events.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{ChatError, Result};
use crate::types::{ChatStreamEvent, Message, ToolCallRequest};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: MessageStartBody,
    },
    ContentBlockStart {
        index: usize,
        content_block: StartBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: BlockDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {},
    MessageStop {},
    Ping {},
    Error {
        error: UpstreamError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct MessageStartBody {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StartBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug)]
enum OpenBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input: String,
    },
}

#[derive(Debug)]
enum ClosedBlock {
    Text(String),
    ToolCall(ToolCallRequest),
}

/// Per-response accumulation state, keyed by content-block index.
#[derive(Debug, Default)]
pub struct AnthropicNormalizer {
    message_id: String,
    open: BTreeMap<usize, OpenBlock>,
    closed: BTreeMap<usize, ClosedBlock>,
}

impl AnthropicNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one SSE `data:` payload.
    pub fn accept(&mut self, raw: &str) -> Result<Vec<ChatStreamEvent>> {
        let event: StreamEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, raw, "dropping unparseable Anthropic stream event");
                return Ok(Vec::new());
            }
        };

        match event {
            StreamEvent::MessageStart { message } => {
                self.message_id = message.id;
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                StartBlock::Text { text } => {
                    let initial = (!text.is_empty())
                        .then(|| ChatStreamEvent::text(&self.message_id, &text));
                    self.open.insert(index, OpenBlock::Text(text));
                    return Ok(initial.into_iter().collect());
                }
                StartBlock::ToolUse { id, name } => {
                    self.open.insert(
                        index,
                        OpenBlock::ToolUse {
                            id,
                            name,
                            input: String::new(),
                        },
                    );
                }
                StartBlock::Other => {
                    warn!(index, "ignoring unsupported Anthropic content block");
                }
            },
            StreamEvent::ContentBlockDelta { index, delta } => {
                return Ok(self.apply_delta(index, delta).into_iter().collect());
            }
            StreamEvent::ContentBlockStop { index } => self.close(index),
            StreamEvent::MessageDelta {} | StreamEvent::MessageStop {} | StreamEvent::Ping {} => {}
            StreamEvent::Error { error } => {
                return Err(ChatError::Provider {
                    provider: "anthropic".into(),
                    message: format!("{}: {}", error.kind, error.message),
                });
            }
            StreamEvent::Unknown => {
                let err = ChatError::UpstreamProtocol(format!("unknown Anthropic event: {raw}"));
                warn!(error = %err, "dropping stream event");
            }
        }
        Ok(Vec::new())
    }

    fn apply_delta(&mut self, index: usize, delta: BlockDelta) -> Option<ChatStreamEvent> {
        match (self.open.get_mut(&index), delta) {
            (Some(OpenBlock::Text(text)), BlockDelta::TextDelta { text: part }) => {
                text.push_str(&part);
                Some(ChatStreamEvent::text(&self.message_id, part))
            }
            (Some(OpenBlock::ToolUse { id, name, input }), BlockDelta::InputJsonDelta { partial_json }) => {
                input.push_str(&partial_json);
                Some(ChatStreamEvent::tool_call_fragment(
                    &self.message_id,
                    id.as_str(),
                    name.as_str(),
                    partial_json,
                ))
            }
            (None, _) => {
                warn!(index, "delta for a content block that was never started");
                None
            }
            (Some(_), delta) => {
                warn!(index, ?delta, "delta does not match its content block");
                None
            }
        }
    }

    fn close(&mut self, index: usize) {
        let Some(block) = self.open.remove(&index) else {
            warn!(index, "stop for a content block that was never started");
            return;
        };
        let block = match block {
            OpenBlock::Text(text) => ClosedBlock::Text(text),
            OpenBlock::ToolUse { id, name, input } => {
                let arguments_json = tool_arguments_json(&id, input);
                ClosedBlock::ToolCall(ToolCallRequest::new(id, name, arguments_json))
            }
        };
        self.closed.insert(index, block);
    }

    /// Assemble the final assistant message once the stream has ended.
    pub fn finish(mut self) -> Result<Message> {
        let dangling: Vec<usize> = self.open.keys().copied().collect();
        for index in dangling {
            warn!(index, "stream ended with an unterminated content block");
            self.close(index);
        }

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in self.closed.into_values() {
            match block {
                ClosedBlock::Text(part) => text.push_str(&part),
                ClosedBlock::ToolCall(call) => tool_calls.push(call),
            }
        }
        Ok(Message::assistant_with_tool_calls(text, tool_calls))
    }
}

/// Canonical arguments for a streamed tool input.
///
/// Valid JSON is re-serialized compactly. Anything else is kept verbatim so
/// the dispatcher reports the exact text the model produced.
fn tool_arguments_json(id: &str, input: String) -> String {
    if input.trim().is_empty() {
        return "{}".to_string();
    }
    match serde_json::from_str::<Value>(&input) {
        Ok(value) => value.to_string(),
        Err(err) => {
            warn!(tool_call_id = id, error = %err, "tool input is not valid JSON");
            input
        }
    }
}
