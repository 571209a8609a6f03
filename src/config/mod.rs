//! Configuration system (layered: defaults < TOML file < environment).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::chat_loop::limits::parse_positive_usize;
use crate::chat_loop::RunLimits;
use crate::error::{ChatError, Result};
use crate::models::ChatModel;

pub const DEFAULT_HISTORY_FILE: &str = "chat_history.json";

const ENV_MODEL: &str = "CHAT_MODEL";
const ENV_MAX_OUTPUT_TOKENS: &str = "CHAT_MAX_OUTPUT_TOKENS";
const ENV_HISTORY_FILE: &str = "CHAT_HISTORY_FILE";

/// Everything needed to build a provider and run a conversation.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    pub model: ChatModel,
    /// Overrides the model preset's output-token budget.
    pub max_output_tokens: Option<u32>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub history_file: PathBuf,
    pub limits: RunLimits,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[redacted]");
        f.debug_struct("ChatConfig")
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("history_file", &self.history_file)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: ChatModel::default(),
            max_output_tokens: None,
            anthropic_api_key: None,
            openai_api_key: None,
            anthropic_base_url: None,
            openai_base_url: None,
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            limits: RunLimits::default(),
        }
    }
}

impl ChatConfig {
    /// Defaults overlaid with the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source)
            .map_err(|e| ChatError::Configuration(format!("invalid config: {e}")))
    }

    /// Read a TOML file, then overlay the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let _ = dotenvy::dotenv();
        let mut config = Self::from_toml_str(&source)?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; empty values count as unset.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = var(ENV_MODEL) {
            self.model = model.parse()?;
        }
        if let Some(raw) = var(ENV_MAX_OUTPUT_TOKENS) {
            let tokens = parse_positive_usize(&raw)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    ChatError::Configuration(format!(
                        "{ENV_MAX_OUTPUT_TOKENS} must be a positive integer, got {raw:?}"
                    ))
                })?;
            self.max_output_tokens = Some(tokens);
        }
        if let Some(key) = var("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = var("ANTHROPIC_BASE_URL") {
            self.anthropic_base_url = Some(url);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.openai_base_url = Some(url);
        }
        if let Some(path) = var(ENV_HISTORY_FILE) {
            self.history_file = PathBuf::from(path);
        }
        self.limits.apply_vars(&lookup);
        Ok(())
    }
}
