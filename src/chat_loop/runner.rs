//! The dispatch loop: provider turn → tool calls → provider turn, until done.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::EventSink;
use super::limits::{RunLimits, BUDGET_EXHAUSTED};
use super::types::{RunId, RunResult};
use crate::error::Result;
use crate::history::HistoryStore;
use crate::provider::{ChatProvider, ChatRequest, ChatTurn};
use crate::state::ChatState;
use crate::strategy::ChatStrategy;
use crate::tools::{dispatch_tool_call, tool_definitions};
use crate::types::{Message, Role};

/// Content of the assistant message closing a cancelled run.
pub const CANCELLED_MESSAGE: &str = "Chat cancelled";

/// Drives one conversation against a provider, a strategy and a history log.
pub struct ChatRunner {
    provider: Arc<dyn ChatProvider>,
    strategy: Arc<dyn ChatStrategy>,
    history: Arc<dyn HistoryStore>,
    state: Arc<ChatState>,
    limits: RunLimits,
}

/// Messages of the run in progress, kept in step with the history log.
struct Transcript<'a> {
    history: &'a dyn HistoryStore,
    context: Vec<Message>,
    appended: Vec<Message>,
}

impl Transcript<'_> {
    /// Persist first, so the log never lags behind memory.
    async fn push(&mut self, message: Message) -> Result<()> {
        self.history.append(&message).await?;
        self.context.push(message.clone());
        self.appended.push(message);
        Ok(())
    }
}

impl ChatRunner {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        strategy: Arc<dyn ChatStrategy>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            provider,
            strategy,
            history,
            state: Arc::new(ChatState::new()),
            limits: RunLimits::default(),
        }
    }

    /// Share state with a front end that needs to cancel or read status.
    pub fn with_state(mut self, state: Arc<ChatState>) -> Self {
        self.state = state;
        self
    }

    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn state(&self) -> Arc<ChatState> {
        self.state.clone()
    }

    pub fn limits(&self) -> RunLimits {
        self.limits
    }

    /// Run the conversation forward from a new user message.
    ///
    /// Tool failures never end the run; they go back to the model as
    /// `is_error` tool results. Provider, history and strategy errors
    /// propagate. The shared state is reset on every exit path.
    pub async fn run(&self, user_message: Message, sink: Option<EventSink>) -> Result<RunResult> {
        let _guard = self.state.begin_run()?;
        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
            "chat run start"
        );

        self.history.append(&user_message).await?;
        let history = self.history.load().await?;
        let system_prompt = self.strategy.system_prompt().await?;
        let context: Vec<Message> = std::iter::once(Message::system(system_prompt))
            .chain(
                self.strategy
                    .context_window(&history)
                    .into_iter()
                    .filter(|m| m.role != Role::System),
            )
            .collect();

        let mut transcript = Transcript {
            history: self.history.as_ref(),
            context,
            appended: vec![user_message],
        };
        let mut provider_calls = 0usize;

        loop {
            if self.state.is_cancelled() {
                return self.cancel(run_id, transcript, provider_calls).await;
            }

            let tools = self.strategy.tools();
            let request = ChatRequest {
                messages: transcript.context.clone(),
                tools: tool_definitions(&tools).await?,
            };

            provider_calls += 1;
            debug!(%run_id, provider_calls, "requesting model turn");
            let message = match self.provider.chat(&request, sink.as_ref(), &self.state).await? {
                ChatTurn::Message(message) => message,
                ChatTurn::Cancelled => return self.cancel(run_id, transcript, provider_calls).await,
            };
            // a provider may finish its turn after the flag flipped; the turn is discarded
            if self.state.is_cancelled() {
                return self.cancel(run_id, transcript, provider_calls).await;
            }
            transcript.push(message.clone()).await?;

            if !message.has_tool_calls() {
                return self.complete(run_id, transcript, provider_calls).await;
            }

            if self.limits.steering_ignored(provider_calls) {
                warn!(
                    %run_id,
                    provider_calls,
                    "model kept calling tools after the iteration budget; stopping"
                );
                for call in message.tool_calls() {
                    transcript
                        .push(Message::tool_result(&call.id, BUDGET_EXHAUSTED, true))
                        .await?;
                }
                return self.complete(run_id, transcript, provider_calls).await;
            }

            let calls = message.tool_calls();
            for (position, call) in calls.iter().enumerate() {
                debug!(%run_id, tool = %call.function_name, tool_call_id = %call.id, "dispatching tool call");
                self.state
                    .set_status(format!("Calling tool: {}", call.function_name));

                let mut result = match dispatch_tool_call(call, &tools, &self.state).await {
                    Ok(output) => Message::tool_result(&call.id, output, false),
                    Err(err) => {
                        warn!(%run_id, tool = %call.function_name, error = %err, "tool call failed");
                        Message::tool_result(&call.id, err.to_string(), true)
                    }
                };
                self.state.reset_status();

                if position + 1 == calls.len()
                    && self.limits.steer(
                        &mut result.content,
                        provider_calls,
                        self.state.tool_error_count(),
                    )
                {
                    info!(
                        %run_id,
                        provider_calls,
                        tool_errors = self.state.tool_error_count(),
                        "tool budget reached, steering model away from tools"
                    );
                }
                transcript.push(result).await?;
            }
        }
    }

    async fn complete(
        &self,
        run_id: RunId,
        transcript: Transcript<'_>,
        provider_calls: usize,
    ) -> Result<RunResult> {
        self.strategy.on_run_complete(&transcript.appended).await?;
        info!(%run_id, provider_calls, "chat run complete");
        Ok(RunResult::completed(run_id, transcript.appended, provider_calls))
    }

    async fn cancel(
        &self,
        run_id: RunId,
        mut transcript: Transcript<'_>,
        provider_calls: usize,
    ) -> Result<RunResult> {
        transcript.push(Message::assistant(CANCELLED_MESSAGE)).await?;
        info!(%run_id, provider_calls, "chat run cancelled");
        Ok(RunResult::cancelled(run_id, transcript.appended, provider_calls))
    }
}
