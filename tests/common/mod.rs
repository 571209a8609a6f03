//! Shared test helpers: scripted provider, strategy and tools.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use toolchat::chat_loop::EventSink;
use toolchat::error::{ChatError, Result};
use toolchat::provider::{ChatProvider, ChatRequest, ChatTurn};
use toolchat::state::ChatState;
use toolchat::strategy::ChatStrategy;
use toolchat::tools::{FunctionTool, ToolFunction, ToolParameters};
use toolchat::types::{Message, ToolCallRequest};

/// What the scripted provider does on one call.
pub enum Step {
    Reply(Message),
    /// Flip the cancellation flag mid-call, then report the cancelled turn.
    CancelDuringCall,
    Fail(ChatError),
}

/// A provider that plays back queued steps and records every request.
pub struct MockProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatRequest>>,
    /// Reply used once the queue is empty.
    fallback: Mutex<Option<Message>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fallback: Mutex::new(None),
        }
    }

    pub fn queue_text(&self, text: &str) -> &Self {
        self.queue(Step::Reply(Message::assistant(text)))
    }

    pub fn queue_tool_call(&self, id: &str, name: &str, arguments_json: &str) -> &Self {
        self.queue(Step::Reply(tool_call_turn(id, name, arguments_json)))
    }

    pub fn queue(&self, step: Step) -> &Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    /// Keep replying with `message` forever.
    pub fn always(&self, message: Message) -> &Self {
        *self.fallback.lock().unwrap() = Some(message);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        _sink: Option<&EventSink>,
        state: &ChatState,
    ) -> Result<ChatTurn> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(message)) => Ok(ChatTurn::Message(message)),
            Some(Step::CancelDuringCall) => {
                state.cancel();
                Ok(ChatTurn::Cancelled)
            }
            Some(Step::Fail(err)) => Err(err),
            None => match self.fallback.lock().unwrap().clone() {
                Some(message) => Ok(ChatTurn::Message(message)),
                None => Ok(ChatTurn::Message(Message::assistant("(script exhausted)"))),
            },
        }
    }
}

pub fn tool_call_turn(id: &str, name: &str, arguments_json: &str) -> Message {
    Message::assistant_with_tool_calls("", vec![ToolCallRequest::new(id, name, arguments_json)])
}

/// Strategy with a fixed prompt and tool set that records completed runs.
pub struct MockStrategy {
    tools: Vec<Arc<dyn ToolFunction>>,
    completed: Mutex<Vec<Vec<Message>>>,
}

impl MockStrategy {
    pub fn new(tools: Vec<Arc<dyn ToolFunction>>) -> Self {
        Self {
            tools,
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn completed_runs(&self) -> Vec<Vec<Message>> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatStrategy for MockStrategy {
    fn tools(&self) -> Vec<Arc<dyn ToolFunction>> {
        self.tools.clone()
    }

    async fn system_prompt(&self) -> Result<String> {
        Ok("You are a test assistant".to_string())
    }

    async fn on_run_complete(&self, messages: &[Message]) -> Result<()> {
        self.completed.lock().unwrap().push(messages.to_vec());
        Ok(())
    }
}

/// `getWidgets` that counts how often it actually ran.
pub fn counting_widgets_tool(runs: Arc<AtomicUsize>) -> Arc<dyn ToolFunction> {
    Arc::new(FunctionTool::new(
        "getWidgets",
        "Return a list of widgets of a given colour",
        ToolParameters::object()
            .string("colour", "The colour of the desired widgets", true)
            .build(),
        move |args| {
            let runs = runs.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                let colour = args.get_str("colour")?;
                Ok(format!("{colour} widgets: Fire chilli widget, Big stop sign widget"))
            }
        },
    ))
}

/// A tool whose every run fails.
pub fn failing_tool(runs: Arc<AtomicUsize>) -> Arc<dyn ToolFunction> {
    Arc::new(FunctionTool::new(
        "runQuery",
        "Run a SQL query",
        ToolParameters::object()
            .string("sql", "The query", true)
            .build(),
        move |_args| {
            let runs = runs.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Err(ChatError::ToolExecution {
                    tool_name: "runQuery".into(),
                    message: "relation \"widgets\" does not exist".into(),
                })
            }
        },
    ))
}
