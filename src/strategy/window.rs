//! Bounded history windows with truncated historical tool output.

use std::sync::Arc;

use async_trait::async_trait;

use super::ChatStrategy;
use crate::error::Result;
use crate::tools::ToolFunction;
use crate::types::{HistoryMessage, Message, Role};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

const TRUNCATED_SUCCESS: &str = "<tool call successful - output truncated>";
const TRUNCATED_ERROR: &str = "<tool call errored - output truncated>";
const TRUNCATED_UNKNOWN: &str = "<tool call output truncated>";

/// The last `limit` messages, extended backwards until the window opens on a
/// user turn so no tool exchange is cut in half.
pub fn window_history(history: &[HistoryMessage], limit: usize) -> Vec<Message> {
    if limit == 0 {
        return Vec::new();
    }
    let mut start = history.len().saturating_sub(limit);
    while start > 0 && history[start].message.role != Role::User {
        start -= 1;
    }
    history[start..].iter().map(|h| h.message.clone()).collect()
}

/// Replace tool-result bodies with short placeholders.
pub fn truncate_tool_outputs(messages: Vec<Message>) -> Vec<Message> {
    messages
        .into_iter()
        .map(|mut message| {
            if message.role == Role::Tool {
                message.content = match message.is_error {
                    Some(true) => TRUNCATED_ERROR,
                    Some(false) => TRUNCATED_SUCCESS,
                    None => TRUNCATED_UNKNOWN,
                }
                .to_string();
            }
            message
        })
        .collect()
}

/// Wraps a strategy, windowing and truncating the history it sees.
pub struct WindowedStrategy<S> {
    inner: S,
    limit: usize,
}

impl<S: ChatStrategy> WindowedStrategy<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ChatStrategy> ChatStrategy for WindowedStrategy<S> {
    fn tools(&self) -> Vec<Arc<dyn ToolFunction>> {
        self.inner.tools()
    }

    async fn system_prompt(&self) -> Result<String> {
        self.inner.system_prompt().await
    }

    fn context_window(&self, history: &[HistoryMessage]) -> Vec<Message> {
        truncate_tool_outputs(window_history(history, self.limit))
    }

    async fn on_run_complete(&self, messages: &[Message]) -> Result<()> {
        self.inner.on_run_complete(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::DemoStrategy;
    use crate::types::ToolCallRequest;
    use pretty_assertions::assert_eq;

    fn log(messages: Vec<Message>) -> Vec<HistoryMessage> {
        messages.into_iter().map(HistoryMessage::now).collect()
    }

    fn exchange(n: usize) -> Vec<Message> {
        let id = format!("call_{n}");
        vec![
            Message::user(format!("question {n}")),
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCallRequest::new(id.clone(), "getWidgets", "{}")],
            ),
            Message::tool_result(id, format!("output {n}"), false),
            Message::assistant(format!("answer {n}")),
        ]
    }

    #[test]
    fn window_extends_back_to_a_user_turn() {
        let history = log([exchange(1), exchange(2)].concat());

        // the last three messages start mid-exchange
        let window = window_history(&history, 3);

        assert_eq!(window.len(), 4);
        assert_eq!(window[0], Message::user("question 2"));
    }

    #[test]
    fn short_history_is_returned_whole() {
        let history = log(exchange(1));
        assert_eq!(window_history(&history, 20).len(), 4);
        assert!(window_history(&history, 0).is_empty());
    }

    #[test]
    fn tool_output_is_replaced_by_outcome_placeholder() {
        let mut unknown = Message::tool_result("c3", "raw", false);
        unknown.is_error = None;
        let messages = vec![
            Message::tool_result("c1", "big output", false),
            Message::tool_result("c2", "stack trace", true),
            unknown,
            Message::assistant("kept"),
        ];

        let truncated = truncate_tool_outputs(messages);

        assert_eq!(truncated[0].content, TRUNCATED_SUCCESS);
        assert_eq!(truncated[1].content, TRUNCATED_ERROR);
        assert_eq!(truncated[2].content, TRUNCATED_UNKNOWN);
        assert_eq!(truncated[3].content, "kept");
        assert_eq!(truncated[1].tool_call_id.as_deref(), Some("c2"));
    }

    #[test]
    fn windowed_strategy_applies_both() {
        let strategy = WindowedStrategy::new(DemoStrategy::new()).with_limit(2);
        let history = log([exchange(1), exchange(2)].concat());

        let window = strategy.context_window(&history);

        assert_eq!(window.len(), 4);
        assert_eq!(window[2].content, TRUNCATED_SUCCESS);
    }
}
