//! Tool contract and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::error::Result;

/// A capability the model may invoke by name.
#[async_trait]
pub trait ToolFunction: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the arguments. May be computed lazily (e.g. from a
    /// database catalogue), hence async.
    async fn parameters(&self) -> Result<Value>;

    /// Run the tool. An `Err` is reported back to the model, never to the caller.
    async fn run(&self, args: &ToolArguments) -> Result<String>;

    /// Environment variables the tool needs at run time.
    fn required_env_vars(&self) -> &[&'static str] {
        &[]
    }
}

type ToolHandler =
    dyn Fn(ToolArguments) -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync;

/// Closure-based tool for quick tool creation.
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    env_vars: Vec<&'static str>,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            env_vars: Vec::new(),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Declare environment variables the tool depends on.
    pub fn with_env_vars(mut self, vars: &[&'static str]) -> Self {
        self.env_vars = vars.to_vec();
        self
    }
}

#[async_trait]
impl ToolFunction for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn parameters(&self) -> Result<Value> {
        Ok(self.parameters.schema.clone())
    }

    async fn run(&self, args: &ToolArguments) -> Result<String> {
        (self.handler)(args.clone()).await
    }

    fn required_env_vars(&self) -> &[&'static str] {
        &self.env_vars
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use serde_json::json;

    fn echo_tool() -> FunctionTool {
        FunctionTool::new(
            "echo",
            "Echo the text back",
            ToolParameters::object().string("text", "Text to echo", true).build(),
            |args| async move { Ok(args.get_str("text")?.to_string()) },
        )
    }

    #[tokio::test]
    async fn closure_tool_runs_handler() {
        let tool = echo_tool();
        let out = tool
            .run(&ToolArguments::new(json!({ "text": "hello" })))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn handler_errors_surface_as_err() {
        let tool = echo_tool();
        let err = tool.run(&ToolArguments::new(json!({}))).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn parameters_return_builder_schema() {
        let tool = echo_tool().with_env_vars(&["ECHO_TOKEN"]);
        let schema = tool.parameters().await.unwrap();
        assert_eq!(schema["required"], json!(["text"]));
        assert_eq!(tool.required_env_vars(), &["ECHO_TOKEN"]);
    }
}
