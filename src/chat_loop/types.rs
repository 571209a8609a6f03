//! Core run types for the dispatch loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Message;

/// Unique run identifier.
pub type RunId = Uuid;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub status: RunStatus,
    /// Every message appended during the run, starting with the user turn.
    pub messages: Vec<Message>,
    pub provider_calls: usize,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn completed(run_id: RunId, messages: Vec<Message>, provider_calls: usize) -> Self {
        Self {
            run_id,
            status: RunStatus::Completed,
            messages,
            provider_calls,
            finished_at: Utc::now(),
        }
    }

    pub fn cancelled(run_id: RunId, messages: Vec<Message>, provider_calls: usize) -> Self {
        Self {
            run_id,
            status: RunStatus::Cancelled,
            messages,
            provider_calls,
            finished_at: Utc::now(),
        }
    }

    /// The final assistant message of the run.
    pub fn last_completion(&self) -> Option<&Message> {
        self.messages.last()
    }
}
