//! OpenAI Chat Completions adapter.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http::{bearer_headers, send_streaming, shared_client, sse_data_stream};
use super::{ChatProvider, ChatRequest, ChatTurn};
use crate::chat_loop::EventSink;
use crate::error::Result;
use crate::models::ProviderKind;
use crate::normalize::{drive_stream, Normalizer};
use crate::state::ChatState;
use crate::translate::openai::to_vendor;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    model_id: String,
    api_key: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAiAdapter {
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = json!({
            "model": self.model_id,
            "messages": to_vendor(&request.messages),
            "stream": true,
            "stream_options": { "include_usage": true },
        });
        let Some(obj) = body.as_object_mut() else {
            return body;
        };

        if let Some(max) = self.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tools.into());
            // one tool call per turn keeps result ordering trivial
            obj.insert("parallel_tool_calls".into(), false.into());
        }
        body
    }
}

#[async_trait]
impl ChatProvider for OpenAiAdapter {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        sink: Option<&EventSink>,
        state: &ChatState,
    ) -> Result<ChatTurn> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %self.model_id,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "OpenAI chat"
        );

        let resp = send_streaming(
            shared_client()?
                .post(&url)
                .headers(bearer_headers(&self.api_key))
                .json(&body),
        )
        .await?;

        drive_stream(
            sse_data_stream(resp),
            Normalizer::for_provider(ProviderKind::OpenAi),
            sink,
            state,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolDefinition;
    use crate::types::Message;

    #[test]
    fn tools_disable_parallel_calls() {
        let adapter = OpenAiAdapter::new("gpt-4o", "sk-test", None);
        let request = ChatRequest {
            messages: vec![Message::system("sys"), Message::user("hi")],
            tools: vec![ToolDefinition {
                name: "getWidgets".into(),
                description: "List widgets".into(),
                parameters: json!({"type": "object"}),
            }],
        };

        let body = adapter.build_request_body(&request);

        assert_eq!(body["parallel_tool_calls"], false);
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(body["tools"][0]["function"]["name"], "getWidgets");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn no_tools_means_no_parallel_flag() {
        let adapter = OpenAiAdapter::new("gpt-4o-mini", "sk-test", None).with_max_tokens(Some(256));
        let body = adapter.build_request_body(&ChatRequest {
            messages: vec![Message::user("hi")],
            tools: vec![],
        });
        assert!(body.get("parallel_tool_calls").is_none());
        assert_eq!(body["max_tokens"], 256);
    }
}
