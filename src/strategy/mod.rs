//! Strategy contract: system prompt, offered tools and history windowing.

pub mod demo;
pub mod window;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::tools::ToolFunction;
use crate::types::{HistoryMessage, Message};

pub use demo::DemoStrategy;
pub use window::{truncate_tool_outputs, window_history, WindowedStrategy, DEFAULT_HISTORY_LIMIT};

/// Supplies the pieces of a conversation the dispatch loop does not own.
#[async_trait]
pub trait ChatStrategy: Send + Sync {
    /// Tools currently offered to the model. Asked again before every
    /// provider call, so the set may change within a run.
    fn tools(&self) -> Vec<Arc<dyn ToolFunction>>;

    /// The system prompt placed at the head of every request.
    async fn system_prompt(&self) -> Result<String>;

    /// Select the prior conversation sent with a new user turn.
    ///
    /// Must never separate a tool result from the assistant turn that
    /// requested it.
    fn context_window(&self, history: &[HistoryMessage]) -> Vec<Message> {
        history.iter().map(|h| h.message.clone()).collect()
    }

    /// Called once a run completes normally. Errors propagate to the caller.
    async fn on_run_complete(&self, _messages: &[Message]) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: ChatStrategy + ?Sized> ChatStrategy for Arc<S> {
    fn tools(&self) -> Vec<Arc<dyn ToolFunction>> {
        (**self).tools()
    }

    async fn system_prompt(&self) -> Result<String> {
        (**self).system_prompt().await
    }

    fn context_window(&self, history: &[HistoryMessage]) -> Vec<Message> {
        (**self).context_window(history)
    }

    async fn on_run_complete(&self, messages: &[Message]) -> Result<()> {
        (**self).on_run_complete(messages).await
    }
}
