//! Records the inventory keeps beyond the shared platform types.

use affix_core::{RelocationRequest, TaskHandle};
use serde::{Deserialize, Serialize};

/// Lifecycle of a relocation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Completed,
}

/// A submitted relocation and its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub handle: TaskHandle,
    pub request: RelocationRequest,
    pub status: TaskStatus,
    /// Unix timestamp of the last status change.
    pub updated_at: u64,
}
