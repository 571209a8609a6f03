//! Single tool-call dispatch: parse, resolve, validate, run.

use std::sync::Arc;

use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::tool::ToolFunction;
use super::validation::validate_arguments;
use crate::error::{ChatError, ToolCallError};
use crate::state::ChatState;
use crate::types::ToolCallRequest;

/// Execute one tool call against the currently offered tools.
///
/// Only an actual run updates the shared state's tool outcome and error
/// streak; calls rejected before running leave it untouched.
pub async fn dispatch_tool_call(
    call: &ToolCallRequest,
    tools: &[Arc<dyn ToolFunction>],
    state: &ChatState,
) -> Result<String, ToolCallError> {
    let args = ToolArguments::parse(&call.arguments_json).map_err(|err| {
        warn!(tool = %call.function_name, error = %err, "failed to parse tool call arguments");
        ToolCallError::ArgumentParse {
            raw: call.arguments_json.clone(),
        }
    })?;

    let tool = tools
        .iter()
        .find(|tool| tool.name() == call.function_name)
        .ok_or_else(|| ToolCallError::NotFound {
            name: call.function_name.clone(),
            available: tools.iter().map(|tool| tool.name().to_string()).collect(),
        })?;

    let schema = tool.parameters().await.map_err(|err| {
        state.record_tool_call(tool.name(), false);
        execution_error(tool.name(), err)
    })?;
    validate_arguments(args.raw(), &schema).map_err(|violations| ToolCallError::Validation {
        name: call.function_name.clone(),
        violations,
    })?;

    debug!(tool = %call.function_name, tool_call_id = %call.id, "running tool");
    match tool.run(&args).await {
        Ok(output) => {
            state.record_tool_call(tool.name(), true);
            Ok(output)
        }
        Err(err) => {
            state.record_tool_call(tool.name(), false);
            Err(execution_error(tool.name(), err))
        }
    }
}

fn execution_error(name: &str, err: ChatError) -> ToolCallError {
    let message = match err {
        ChatError::ToolExecution { message, .. } => message,
        other => other.to_string(),
    };
    ToolCallError::Execution {
        name: name.to_string(),
        message,
    }
}
