//! Error types for Toolchat.

use thiserror::Error;

/// Primary error type for all Toolchat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown content block: {0}")]
    UnknownContentBlock(String),

    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),

    #[error("Provider error: {provider} — {message}")]
    Provider { provider: String, message: String },

    #[error("Tool execution error: {tool_name} — {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A chat run is already in progress")]
    RunInProgress,

    #[error("Strategy error: {0}")]
    Strategy(String),

    #[error("History error: {0}")]
    History(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Server,
    Api,
    Configuration,
    Serialization,
    Protocol,
    ToolExecution,
    Unknown,
}

impl ChatError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::UnknownRole(_) | Self::UnknownContentBlock(_) | Self::UpstreamProtocol(_) => {
                ErrorCategory::Protocol
            }
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether a caller-level retry could help. Toolchat itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server
        )
    }
}

/// Tool-level failures recovered inside the dispatch loop.
///
/// These never escape a run: each one becomes an `is_error` tool message whose
/// content is this error's `Display` text, so the model can react to it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolCallError {
    #[error("Failed to parse tool call as JSON: {raw}")]
    ArgumentParse { raw: String },

    #[error("You do not currently have access to the tool: {name}. Your currently available tools are: {}", .available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("Invalid parameters provided for tool {name}. Check the parameters and try again. The errors are: {}", .violations.join("; "))]
    Validation { name: String, violations: Vec<String> },

    #[error("{message}")]
    Execution { name: String, message: String },
}

impl ToolCallError {
    /// Whether this failure came from running the tool (as opposed to rejecting the call).
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }
}

/// Provider-tagged error summary for front ends.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdapterErrorReport {
    pub adapter: String,
    pub message: String,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;
