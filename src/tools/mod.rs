//! Tool contract, argument validation and dispatch.

pub mod arguments;
pub mod dispatch;
pub mod tool;
pub mod types;
pub mod validation;

use std::sync::Arc;

pub use arguments::ToolArguments;
pub use dispatch::dispatch_tool_call;
pub use tool::{FunctionTool, ToolFunction};
pub use types::{ParameterBuilder, ToolParameters};

use crate::error::Result;
use crate::provider::ToolDefinition;

/// Resolve each tool's schema into the definitions sent to the provider.
pub async fn tool_definitions(tools: &[Arc<dyn ToolFunction>]) -> Result<Vec<ToolDefinition>> {
    let mut definitions = Vec::with_capacity(tools.len());
    for tool in tools {
        definitions.push(ToolDefinition {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters().await?,
        });
    }
    Ok(definitions)
}

/// Tools whose required environment variables are unset, with the missing names.
pub fn missing_env_vars(tools: &[Arc<dyn ToolFunction>]) -> Vec<(String, Vec<&'static str>)> {
    tools
        .iter()
        .filter_map(|tool| {
            let missing: Vec<&'static str> = tool
                .required_env_vars()
                .iter()
                .copied()
                .filter(|var| std::env::var(var).map_or(true, |v| v.is_empty()))
                .collect();
            (!missing.is_empty()).then(|| (tool.name().to_string(), missing))
        })
        .collect()
}
