//! Shared chat run state: cancellation, run exclusivity, tool outcomes.
//!
//! One `ChatState` is shared (behind an `Arc`) between the running loop and
//! whoever may cancel it. All fields are reset when the run's [`RunGuard`]
//! drops, on every exit path.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::info;

use crate::error::{ChatError, Result};

/// Status text shown while a run is active.
pub const DEFAULT_STATUS: &str = "Working...";

/// Outcome of the most recent tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastToolCall {
    pub name: String,
    pub success: bool,
}

#[derive(Debug, Default)]
struct ToolOutcomes {
    last_successful: Option<String>,
    last: Option<LastToolCall>,
}

#[derive(Debug)]
pub struct ChatState {
    cancelled: AtomicBool,
    in_progress: AtomicBool,
    tool_errors: AtomicUsize,
    outcomes: Mutex<ToolOutcomes>,
    status: Mutex<String>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            in_progress: AtomicBool::new(false),
            tool_errors: AtomicUsize::new(0),
            outcomes: Mutex::new(ToolOutcomes::default()),
            status: Mutex::new(DEFAULT_STATUS.to_string()),
        }
    }

    /// Mark a run as active. Fails if another run already holds the state.
    ///
    /// A cancellation requested before the run starts still applies to it.
    pub fn begin_run(&self) -> Result<RunGuard<'_>> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ChatError::RunInProgress);
        }
        Ok(RunGuard { state: self })
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Request cooperative cancellation of the active run.
    pub fn cancel(&self) {
        info!("chat cancellation requested");
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Record a tool outcome. Success clears the error streak; failure extends it.
    pub fn record_tool_call(&self, name: &str, success: bool) {
        let mut outcomes = self.outcomes();
        outcomes.last = Some(LastToolCall {
            name: name.to_string(),
            success,
        });
        if success {
            outcomes.last_successful = Some(name.to_string());
            self.tool_errors.store(0, Ordering::Release);
        } else {
            self.tool_errors.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub fn last_tool_call(&self) -> Option<LastToolCall> {
        self.outcomes().last.clone()
    }

    /// Take the name of the last successful tool call, clearing it.
    pub fn pop_last_successful_tool_call(&self) -> Option<String> {
        self.outcomes().last_successful.take()
    }

    /// Consecutive tool execution failures in the current run.
    pub fn tool_error_count(&self) -> usize {
        self.tool_errors.load(Ordering::Acquire)
    }

    pub fn status(&self) -> String {
        lock(&self.status).clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        *lock(&self.status) = status.into();
    }

    pub fn reset_status(&self) {
        self.set_status(DEFAULT_STATUS);
    }

    fn outcomes(&self) -> MutexGuard<'_, ToolOutcomes> {
        lock(&self.outcomes)
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
        self.tool_errors.store(0, Ordering::Release);
        *self.outcomes() = ToolOutcomes::default();
        self.reset_status();
        self.in_progress.store(false, Ordering::Release);
    }
}

// a panic while holding these locks cannot leave the plain data inconsistent
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Held for the lifetime of one run; resets the state when dropped.
#[derive(Debug)]
pub struct RunGuard<'a> {
    state: &'a ChatState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.reset();
    }
}
