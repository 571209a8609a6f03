//! Per-run tool budgets and the steering text appended when they run out.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TOOL_CALL_ITERATIONS: usize = 10;
pub const DEFAULT_MAX_TOOL_ERRORS_PER_RUN: usize = 3;

pub(crate) const MAX_TOOL_CALL_ITERATIONS_ENV: &str = "MAX_TOOL_CALL_ITERATIONS";
pub(crate) const MAX_TOOL_ERRORS_PER_RUN_ENV: &str = "MAX_TOOL_ERRORS_PER_RUN";

pub const ITERATION_BUDGET_STEERING: &str = "\nYou've reached the maximum number of tool calls, do not call any more tools now. Do not apologise to the user, but update them with progress and check if they wish to continue";

pub const ERROR_BUDGET_STEERING: &str = "\nYou've reached the maximum number of tool errors for this run, do not call any more tools now. Do not apologise to the user, but update them with progress and check if they wish to continue";

pub const BUDGET_EXHAUSTED: &str =
    "Tool call budget exhausted for this run. The tool was not called.";

/// Soft budgets for one run.
///
/// Reaching either budget steers the model away from tools; only a model
/// that keeps calling tools after the iteration steering is hard-stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    pub max_tool_call_iterations: usize,
    pub max_tool_errors_per_run: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_tool_call_iterations: DEFAULT_MAX_TOOL_CALL_ITERATIONS,
            max_tool_errors_per_run: DEFAULT_MAX_TOOL_ERRORS_PER_RUN,
        }
    }
}

impl RunLimits {
    /// Override from `MAX_TOOL_CALL_ITERATIONS` / `MAX_TOOL_ERRORS_PER_RUN`.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Non-positive or unparseable values keep the current limit.
    pub(crate) fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let limit = |key: &str| lookup(key).and_then(|v| parse_positive_usize(&v));
        if let Some(value) = limit(MAX_TOOL_CALL_ITERATIONS_ENV) {
            self.max_tool_call_iterations = value;
        }
        if let Some(value) = limit(MAX_TOOL_ERRORS_PER_RUN_ENV) {
            self.max_tool_errors_per_run = value;
        }
    }

    pub fn iteration_budget_reached(&self, provider_calls: usize) -> bool {
        provider_calls >= self.max_tool_call_iterations
    }

    /// The model already got the iteration steering and asked for tools again.
    pub fn steering_ignored(&self, provider_calls: usize) -> bool {
        provider_calls > self.max_tool_call_iterations
    }

    pub fn error_budget_reached(&self, tool_errors: usize) -> bool {
        tool_errors >= self.max_tool_errors_per_run
    }

    /// Append whichever steering instructions apply to a tool result.
    pub(crate) fn steer(&self, content: &mut String, provider_calls: usize, tool_errors: usize) -> bool {
        let mut steered = false;
        if self.iteration_budget_reached(provider_calls) {
            content.push_str(ITERATION_BUDGET_STEERING);
            steered = true;
        }
        if self.error_budget_reached(tool_errors) {
            content.push_str(ERROR_BUDGET_STEERING);
            steered = true;
        }
        steered
    }
}

pub(crate) fn parse_positive_usize(value: &str) -> Option<usize> {
    let parsed = value.trim().parse::<usize>().ok()?;
    if parsed == 0 {
        None
    } else {
        Some(parsed)
    }
}
