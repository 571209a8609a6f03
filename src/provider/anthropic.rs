//! Anthropic Messages API adapter.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http::{anthropic_headers, send_streaming, shared_client, sse_data_stream};
use super::{ChatProvider, ChatRequest, ChatTurn};
use crate::chat_loop::EventSink;
use crate::error::Result;
use crate::models::ProviderKind;
use crate::normalize::{drive_stream, Normalizer};
use crate::state::ChatState;
use crate::translate::anthropic::to_vendor;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    model_id: String,
    max_tokens: u32,
    api_key: String,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(
        model_id: impl Into<String>,
        max_tokens: u32,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            max_tokens,
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn build_request_body(&self, request: &ChatRequest) -> Result<serde_json::Value> {
        let prompt = to_vendor(&request.messages)?;

        let mut body = json!({
            "model": self.model_id,
            "max_tokens": self.max_tokens,
            "messages": prompt.messages,
            "stream": true,
        });
        let Some(obj) = body.as_object_mut() else {
            return Ok(body);
        };

        if let Some(system) = prompt.system.filter(|s| !s.is_empty()) {
            obj.insert("system".into(), system.into());
        }
        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.parameters,
                    })
                })
                .collect();
            obj.insert("tools".into(), tools.into());
        }
        Ok(body)
    }
}

#[async_trait]
impl ChatProvider for AnthropicAdapter {
    fn provider_name(&self) -> &str {
        "anthropic"
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
        let body = self.build_request_body(request)?;
        let url = format!("{}/messages", self.base_url);

        debug!(
            model = %self.model_id,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Anthropic chat"
        );

        let resp = send_streaming(
            shared_client()?
                .post(&url)
                .headers(anthropic_headers(&self.api_key, API_VERSION))
                .json(&body),
        )
        .await?;

        drive_stream(
            sse_data_stream(resp),
            Normalizer::for_provider(ProviderKind::Anthropic),
            sink,
            state,
        )
        .await
    }
}
