//! Provider adapters: translator + normalizer + outbound streaming request.

pub mod anthropic;
pub mod http;
pub mod openai;

use async_trait::async_trait;

use crate::chat_loop::EventSink;
use crate::config::ChatConfig;
use crate::error::{AdapterErrorReport, ChatError, Result};
use crate::models::ProviderKind;
use crate::state::ChatState;
use crate::types::Message;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiAdapter;

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One model turn request: the context window plus the offered tools.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// What a single provider call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatTurn {
    /// The complete assistant message.
    Message(Message),
    /// Cancellation was observed mid-stream; the transport has been closed.
    Cancelled,
}

/// A model backend the dispatch loop can call.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g., "anthropic", "openai").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Stream one assistant turn, forwarding canonical events to `sink`.
    async fn chat(
        &self,
        request: &ChatRequest,
        sink: Option<&EventSink>,
        state: &ChatState,
    ) -> Result<ChatTurn>;

    /// Provider-tagged error summary for front ends.
    fn format_error(&self, error: &ChatError) -> AdapterErrorReport {
        AdapterErrorReport {
            adapter: self.provider_name().to_string(),
            message: error.to_string(),
        }
    }
}

/// The built-in providers, selected once from configuration.
#[derive(Debug, Clone)]
pub enum ProviderAdapter {
    Anthropic(AnthropicAdapter),
    OpenAi(OpenAiAdapter),
}

impl ProviderAdapter {
    /// Build the adapter for the configured model.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let model_id = config.model.model_id().to_string();
        match config.model.provider() {
            ProviderKind::Anthropic => {
                let api_key = config
                    .anthropic_api_key
                    .clone()
                    .ok_or_else(|| ChatError::Authentication("Missing ANTHROPIC_API_KEY".into()))?;
                let max_tokens = config
                    .max_output_tokens
                    .or_else(|| config.model.max_output_tokens())
                    .unwrap_or(crate::models::DEFAULT_ANTHROPIC_MAX_TOKENS);
                Ok(Self::Anthropic(AnthropicAdapter::new(
                    model_id,
                    max_tokens,
                    api_key,
                    config.anthropic_base_url.clone(),
                )))
            }
            ProviderKind::OpenAi => {
                let api_key = config
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| ChatError::Authentication("Missing OPENAI_API_KEY".into()))?;
                Ok(Self::OpenAi(
                    OpenAiAdapter::new(model_id, api_key, config.openai_base_url.clone())
                        .with_max_tokens(config.max_output_tokens),
                ))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Anthropic(_) => ProviderKind::Anthropic,
            Self::OpenAi(_) => ProviderKind::OpenAi,
        }
    }
}

#[async_trait]
impl ChatProvider for ProviderAdapter {
    fn provider_name(&self) -> &str {
        match self {
            Self::Anthropic(a) => a.provider_name(),
            Self::OpenAi(a) => a.provider_name(),
        }
    }

    fn model_id(&self) -> &str {
        match self {
            Self::Anthropic(a) => a.model_id(),
            Self::OpenAi(a) => a.model_id(),
        }
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        sink: Option<&EventSink>,
        state: &ChatState,
    ) -> Result<ChatTurn> {
        match self {
            Self::Anthropic(a) => a.chat(request, sink, state).await,
            Self::OpenAi(a) => a.chat(request, sink, state).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatModel, ModelPreset};

    fn config(model: ModelPreset) -> ChatConfig {
        ChatConfig {
            model: ChatModel::from(model),
            ..ChatConfig::default()
        }
    }

    #[test]
    fn missing_key_is_an_authentication_error() {
        let err = ProviderAdapter::from_config(&config(ModelPreset::Gpt4o)).unwrap_err();
        assert!(matches!(err, ChatError::Authentication(msg) if msg.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn selects_variant_from_model_preset() {
        let mut cfg = config(ModelPreset::ClaudeOpus);
        cfg.anthropic_api_key = Some("sk-ant-test".into());
        let adapter = ProviderAdapter::from_config(&cfg).unwrap();
        assert_eq!(adapter.kind(), ProviderKind::Anthropic);
        assert_eq!(adapter.model_id(), "claude-3-opus-20240229");
        assert_eq!(adapter.provider_name(), "anthropic");
    }

    #[test]
    fn format_error_tags_the_adapter() {
        let mut cfg = config(ModelPreset::Gpt4oMini);
        cfg.openai_api_key = Some("sk-test".into());
        let adapter = ProviderAdapter::from_config(&cfg).unwrap();
        let report = adapter.format_error(&ChatError::api(500, "boom"));
        assert_eq!(report.adapter, "openai");
        assert!(report.message.contains("boom"));
    }
}
