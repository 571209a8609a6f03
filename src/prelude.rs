//! Convenience re-exports for common use.

pub use crate::chat_loop::{ChatRunner, EventSink, RunLimits, RunResult, RunStatus};
pub use crate::config::ChatConfig;
pub use crate::error::{ChatError, Result, ToolCallError};
pub use crate::history::{HistoryStore, MemoryHistoryStore};
pub use crate::models::{ChatModel, ProviderKind};
pub use crate::provider::{ChatProvider, ChatRequest, ChatTurn, ProviderAdapter};
pub use crate::state::ChatState;
pub use crate::strategy::ChatStrategy;
pub use crate::tools::{FunctionTool, ToolArguments, ToolFunction, ToolParameters};
pub use crate::types::{ChatStreamEvent, HistoryMessage, Message, Role, ToolCallRequest};
