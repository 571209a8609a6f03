//! OpenAI chat-completions chunks → canonical stream events.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::error::{ChatError, Result};
use crate::translate::openai::{from_vendor, OpenAiMessage};
use crate::types::{ChatStreamEvent, Message, ToolCallRequest};

/// Compatible servers send explicit `null` where OpenAI omits the field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default, deserialize_with = "null_as_default")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default, deserialize_with = "null_as_default")]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    tool_calls: Vec<ToolCallDelta>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

/// Per-response accumulation state, keyed by tool-call index.
#[derive(Debug, Default)]
pub struct OpenAiNormalizer {
    message_id: String,
    text: String,
    calls: BTreeMap<usize, PendingCall>,
}

impl OpenAiNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one SSE `data:` payload.
    pub fn accept(&mut self, raw: &str) -> Result<Vec<ChatStreamEvent>> {
        let chunk: StreamChunk = match serde_json::from_str(raw) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(error = %err, raw, "dropping unparseable OpenAI stream chunk");
                return Ok(Vec::new());
            }
        };

        if let Some(error) = chunk.error {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ChatError::Provider {
                provider: "openai".into(),
                message,
            });
        }

        if self.message_id.is_empty() && !chunk.id.is_empty() {
            self.message_id = chunk.id;
        }

        let mut events = Vec::new();
        // the trailing usage chunk carries no choices
        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ok(events);
        };

        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            self.text.push_str(&content);
            events.push(ChatStreamEvent::text(&self.message_id, content));
        }
        for delta in choice.delta.tool_calls {
            events.extend(self.apply_tool_delta(delta));
        }

        match choice.finish_reason.as_deref() {
            None | Some("stop") | Some("tool_calls") | Some("length") => {}
            Some(other) => warn!(finish_reason = other, "unexpected finish reason"),
        }
        Ok(events)
    }

    fn apply_tool_delta(&mut self, delta: ToolCallDelta) -> Option<ChatStreamEvent> {
        let function = delta.function.unwrap_or_default();

        if !self.calls.contains_key(&delta.index) {
            let Some(id) = delta.id else {
                warn!(index = delta.index, "tool call delta for an unknown call");
                return None;
            };
            self.calls.insert(
                delta.index,
                PendingCall {
                    id,
                    name: String::new(),
                    arguments: String::new(),
                },
            );
        }
        let call = self.calls.get_mut(&delta.index)?;

        if call.name.is_empty() {
            if let Some(name) = function.name {
                call.name = name;
            }
        }
        let fragment = function.arguments.filter(|a| !a.is_empty())?;
        call.arguments.push_str(&fragment);
        Some(ChatStreamEvent::tool_call_fragment(
            &self.message_id,
            call.id.as_str(),
            call.name.as_str(),
            fragment,
        ))
    }

    /// Assemble the final assistant message once the stream has ended.
    pub fn finish(self) -> Result<Message> {
        let tool_calls: Vec<ToolCallRequest> = self
            .calls
            .into_values()
            .map(|call| ToolCallRequest::new(call.id, call.name, call.arguments))
            .collect();
        let content = if self.text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(self.text)
        };
        from_vendor(&OpenAiMessage {
            role: "assistant".into(),
            content,
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(normalizer: &mut OpenAiNormalizer, chunks: &[&str]) -> Vec<ChatStreamEvent> {
        chunks
            .iter()
            .flat_map(|raw| normalizer.accept(raw).unwrap())
            .collect()
    }

    #[test]
    fn text_chunks_map_one_to_one() {
        let mut normalizer = OpenAiNormalizer::new();
        let events = feed(
            &mut normalizer,
            &[
                r#"{"id":"chatcmpl-1","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#,
                r#"{"id":"chatcmpl-1","choices":[{"index":0,"delta":{"content":"2+2 "},"finish_reason":null}]}"#,
                r#"{"id":"chatcmpl-1","choices":[{"index":0,"delta":{"content":"is 4"},"finish_reason":null}]}"#,
                r#"{"id":"chatcmpl-1","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
                r#"{"id":"chatcmpl-1","choices":[],"usage":{"prompt_tokens":9,"completion_tokens":3,"total_tokens":12}}"#,
            ],
        );
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::text("chatcmpl-1", "2+2 "),
                ChatStreamEvent::text("chatcmpl-1", "is 4"),
            ]
        );
        let message = normalizer.finish().unwrap();
        assert_eq!(message, Message::assistant("2+2 is 4"));
    }

    #[test]
    fn tool_call_name_is_captured_once_and_reused() {
        let mut normalizer = OpenAiNormalizer::new();
        let events = feed(
            &mut normalizer,
            &[
                r#"{"id":"chatcmpl-2","choices":[{"index":0,"delta":{"role":"assistant","content":null,"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"getWidgets","arguments":""}}]},"finish_reason":null}]}"#,
                r#"{"id":"chatcmpl-2","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"colour\""}}]},"finish_reason":null}]}"#,
                r#"{"id":"chatcmpl-2","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":":\"red\"}"}}]},"finish_reason":null}]}"#,
                r#"{"id":"chatcmpl-2","choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
            ],
        );
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::tool_call_fragment("chatcmpl-2", "call_1", "getWidgets", "{\"colour\""),
                ChatStreamEvent::tool_call_fragment("chatcmpl-2", "call_1", "getWidgets", ":\"red\"}"),
            ]
        );

        let message = normalizer.finish().unwrap();
        assert_eq!(message.content, "");
        assert_eq!(
            message.tool_calls(),
            &[ToolCallRequest::new("call_1", "getWidgets", r#"{"colour":"red"}"#)]
        );
    }

    #[test]
    fn explicit_nulls_are_treated_as_absent() {
        let mut normalizer = OpenAiNormalizer::new();
        let events = feed(
            &mut normalizer,
            &[
                r#"{"id":"c1","choices":[{"index":0,"delta":{"role":"assistant","content":"hi","tool_calls":null},"finish_reason":null}]}"#,
                r#"{"id":"c1","choices":[{"index":0,"delta":null,"finish_reason":"stop"}]}"#,
                r#"{"id":null,"choices":null,"usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4}}"#,
            ],
        );
        assert_eq!(events, vec![ChatStreamEvent::text("c1", "hi")]);
        assert_eq!(normalizer.finish().unwrap(), Message::assistant("hi"));
    }

    #[test]
    fn delta_for_unseen_call_is_dropped() {
        let mut normalizer = OpenAiNormalizer::new();
        let events = feed(
            &mut normalizer,
            &[r#"{"id":"chatcmpl-3","choices":[{"index":0,"delta":{"tool_calls":[{"index":2,"function":{"arguments":"{}"}}]},"finish_reason":null}]}"#],
        );
        assert!(events.is_empty());
        assert!(!normalizer.finish().unwrap().has_tool_calls());
    }

    #[test]
    fn error_payload_fails_the_stream() {
        let mut normalizer = OpenAiNormalizer::new();
        let err = normalizer
            .accept(r#"{"error":{"message":"server overloaded","type":"server_error"}}"#)
            .unwrap_err();
        assert!(matches!(err, ChatError::Provider { message, .. } if message == "server overloaded"));
    }
}
