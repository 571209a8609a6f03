//! Canonical streaming events and their JSON-lines wire encoding.

use serde::{Deserialize, Serialize};

/// A normalized event emitted while a provider response streams in.
///
/// Events reach the caller in the exact order the provider produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    /// A fragment of assistant text.
    Text { id: String, content: String },
    /// A raw fragment of a tool call's JSON arguments. Fragments are not
    /// individually parseable; concatenate them per `tool_call_id`.
    ToolCallFragment {
        id: String,
        tool_call_id: String,
        name: String,
        json_fragment: String,
    },
}

impl ChatStreamEvent {
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text {
            id: id.into(),
            content: content.into(),
        }
    }

    pub fn tool_call_fragment(
        id: impl Into<String>,
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        json_fragment: impl Into<String>,
    ) -> Self {
        Self::ToolCallFragment {
            id: id.into(),
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            json_fragment: json_fragment.into(),
        }
    }

    /// Wire representation pushed to front ends.
    ///
    /// `chat` lines carry the provider message id; `tool` lines carry the
    /// tool-call id so fragments of one call group together.
    pub fn to_wire(&self) -> StreamWireEvent {
        match self {
            Self::Text { id, content } => StreamWireEvent {
                id: id.clone(),
                kind: StreamWireKind::Chat,
                chat: Some(WireChat {
                    content: content.clone(),
                }),
                tool: None,
            },
            Self::ToolCallFragment {
                tool_call_id,
                name,
                json_fragment,
                ..
            } => StreamWireEvent {
                id: tool_call_id.clone(),
                kind: StreamWireKind::Tool,
                chat: None,
                tool: Some(WireTool {
                    name: name.clone(),
                    content: json_fragment.clone(),
                }),
            },
        }
    }

    /// One JSON object terminated by a newline.
    pub fn to_wire_line(&self) -> String {
        let mut line = serde_json::to_string(&self.to_wire())
            .unwrap_or_else(|_| String::from("{}"));
        line.push('\n');
        line
    }
}

/// `{"id", "type": "chat"|"tool", "chat"?: {...}, "tool"?: {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamWireEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StreamWireKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<WireChat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<WireTool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamWireKind {
    Chat,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireChat {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireTool {
    pub name: String,
    pub content: String,
}
