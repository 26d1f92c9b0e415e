//! Task record wire types and the task state machine.

use crate::error::McpError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Whether `self -> next` is a permitted edge of the task state machine.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "tools/call")]
    ToolsCall,
    #[serde(rename = "sampling/createMessage")]
    SamplingCreateMessage,
    #[serde(rename = "elicitation/create")]
    ElicitationCreate,
}

/// Error raised attempting an invalid task-state transition.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid task transition: {from:?} -> {to:?}")]
pub struct InvalidTaskTransition {
    pub from: TaskState,
    pub to: TaskState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub current: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskProgress {
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total
            .filter(|t| *t > 0.0)
            .map(|t| (self.current / t * 100.0).clamp(0.0, 100.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<McpError> for TaskError {
    fn from(err: McpError) -> Self {
        Self {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

/// Durable record of a long-running operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "startedAt", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Task {
    #[must_use]
    pub fn new(task_type: TaskType, metadata: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_type,
            state: TaskState::Pending,
            progress: None,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            metadata,
        }
    }

    /// Apply a validated state transition, stamping `updated_at` and, where
    /// relevant, `started_at`/`completed_at`.
    ///
    /// # Errors
    /// Returns [`InvalidTaskTransition`] if the edge is not permitted.
    pub fn transition(&mut self, next: TaskState) -> Result<(), InvalidTaskTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTaskTransition {
                from: self.state,
                to: next,
            });
        }
        let now = Utc::now();
        self.state = next;
        self.updated_at = now;
        if next == TaskState::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        Ok(())
    }

    /// Update progress; ignored unless the task is `Running` (caller decides
    /// whether to surface that as an error — the manager silently drops it
    /// per the source's behavior).
    pub fn update_progress(&mut self, current: f64, total: Option<f64>, message: Option<String>) {
        if self.state != TaskState::Running {
            return;
        }
        self.progress = Some(TaskProgress {
            current,
            total,
            message,
        });
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn duration_seconds(&self) -> Option<f64> {
        let start = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }
}
