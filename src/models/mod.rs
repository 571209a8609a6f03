//! Model presets and provider selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ChatError;

/// Output-token budget used when an Anthropic model has no preset value.
pub const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// Which vendor protocol a model speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[strum(to_string = "anthropic", serialize = "claude")]
    Anthropic,
    #[strum(serialize = "openai")]
    OpenAi,
}

/// Built-in model presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ModelPreset {
    ClaudeSonnet,
    ClaudeOpus,
    #[strum(serialize = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4o-mini")]
    Gpt4oMini,
}

impl ModelPreset {
    pub fn provider(self) -> ProviderKind {
        match self {
            Self::ClaudeSonnet | Self::ClaudeOpus => ProviderKind::Anthropic,
            Self::Gpt4o | Self::Gpt4oMini => ProviderKind::OpenAi,
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            Self::ClaudeSonnet => "claude-3-5-sonnet-20240620",
            Self::ClaudeOpus => "claude-3-opus-20240229",
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
        }
    }

    pub fn max_output_tokens(self) -> Option<u32> {
        match self {
            Self::ClaudeSonnet => Some(8192),
            Self::ClaudeOpus => Some(4096),
            Self::Gpt4o | Self::Gpt4oMini => None,
        }
    }
}

/// The model a chat runs against: a preset, or `provider:model-id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChatModel {
    Preset(ModelPreset),
    Custom {
        provider: ProviderKind,
        model_id: String,
    },
}

impl ChatModel {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Preset(preset) => preset.provider(),
            Self::Custom { provider, .. } => *provider,
        }
    }

    /// Identifier sent on the wire.
    pub fn model_id(&self) -> &str {
        match self {
            Self::Preset(preset) => preset.model_id(),
            Self::Custom { model_id, .. } => model_id,
        }
    }

    /// Default output-token cap. Anthropic requires one, OpenAI does not.
    pub fn max_output_tokens(&self) -> Option<u32> {
        match self {
            Self::Preset(preset) => preset.max_output_tokens(),
            Self::Custom {
                provider: ProviderKind::Anthropic,
                ..
            } => Some(DEFAULT_ANTHROPIC_MAX_TOKENS),
            Self::Custom { .. } => None,
        }
    }
}

impl Default for ChatModel {
    fn default() -> Self {
        Self::Preset(ModelPreset::ClaudeSonnet)
    }
}

impl From<ModelPreset> for ChatModel {
    fn from(preset: ModelPreset) -> Self {
        Self::Preset(preset)
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preset(preset) => write!(f, "{preset}"),
            Self::Custom { provider, model_id } => write!(f, "{provider}:{model_id}"),
        }
    }
}

impl FromStr for ChatModel {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(preset) = s.parse::<ModelPreset>() {
            return Ok(Self::Preset(preset));
        }
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            ChatError::Configuration(format!(
                "Unknown model '{s}'. Use a preset or 'provider:model-id'"
            ))
        })?;
        let provider = provider
            .parse::<ProviderKind>()
            .map_err(|_| ChatError::Configuration(format!("Unknown provider '{provider}'")))?;
        if model_id.is_empty() {
            return Err(ChatError::Configuration(format!("Missing model id in '{s}'")));
        }
        Ok(Self::Custom {
            provider,
            model_id: model_id.to_string(),
        })
    }
}

impl TryFrom<String> for ChatModel {
    type Error = ChatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChatModel> for String {
    fn from(model: ChatModel) -> Self {
        model.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_parse_from_kebab_case() {
        let model: ChatModel = "claude-opus".parse().unwrap();
        assert_eq!(model, ChatModel::Preset(ModelPreset::ClaudeOpus));
        assert_eq!(model.model_id(), "claude-3-opus-20240229");
        assert_eq!(model.max_output_tokens(), Some(4096));
        assert_eq!(model.provider(), ProviderKind::Anthropic);

        let model: ChatModel = "gpt-4o-mini".parse().unwrap();
        assert_eq!(model.provider(), ProviderKind::OpenAi);
        assert_eq!(model.to_string(), "gpt-4o-mini");
    }

    #[test]
    fn custom_models_use_provider_prefix() {
        let model: ChatModel = "anthropic:claude-3-haiku-20240307".parse().unwrap();
        assert_eq!(model.model_id(), "claude-3-haiku-20240307");
        assert_eq!(model.max_output_tokens(), Some(DEFAULT_ANTHROPIC_MAX_TOKENS));
        assert_eq!(model.to_string(), "anthropic:claude-3-haiku-20240307");

        let model: ChatModel = "openai:gpt-4-turbo".parse().unwrap();
        assert_eq!(model.provider(), ProviderKind::OpenAi);
        assert_eq!(model.max_output_tokens(), None);
    }

    #[test]
    fn unknown_models_are_configuration_errors() {
        assert!(matches!(
            "llama".parse::<ChatModel>(),
            Err(ChatError::Configuration(_))
        ));
        assert!(matches!(
            "mistral:large".parse::<ChatModel>(),
            Err(ChatError::Configuration(_))
        ));
    }

    #[test]
    fn model_serializes_as_plain_string() {
        let json = serde_json::to_string(&ChatModel::default()).unwrap();
        assert_eq!(json, "\"claude-sonnet\"");
        let back: ChatModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ChatModel::default());
    }
}
