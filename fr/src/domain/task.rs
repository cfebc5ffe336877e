//! Task domain type
//!
//! A task is one unit of folder-processing work, tracked by identifier,
//! status, and progress.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::id::generate_task_id;

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its runner to pick it up
    #[default]
    Pending,
    /// Engine invocation in flight
    Running,
    /// Finished successfully
    Done,
    /// Finished with an error
    Error,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl TaskStatus {
    /// Terminal statuses permit no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// How photos containing faces from several clusters are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JointMode {
    #[default]
    Copy,
    Move,
}

impl std::fmt::Display for JointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Move => write!(f, "move"),
        }
    }
}

/// Options forwarded to the clustering engine for one task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub include_excluded: bool,
    pub joint_mode: JointMode,
    pub post_validate: bool,
}

/// One unit of queued/running/finished folder-processing work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, generated fresh per batch
    pub id: String,

    /// Source folder this task processes
    pub folder_path: String,

    /// Current status
    pub status: TaskStatus,

    /// Progress in percent (0..=100)
    pub progress: u8,

    /// Human-readable status message
    pub message: String,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Set once the task reaches a terminal status (Unix milliseconds)
    pub completed_at: Option<i64>,

    /// Engine options captured at creation
    pub options: ProcessingOptions,

    /// Error description, if the task failed
    pub error: Option<String>,
}

impl Task {
    /// Create a new pending task with a generated identifier
    pub fn new(folder_path: impl Into<String>, options: ProcessingOptions) -> Self {
        Self {
            id: generate_task_id(),
            folder_path: folder_path.into(),
            status: TaskStatus::Pending,
            progress: 0,
            message: "Queued".to_string(),
            created_at: now_ms(),
            completed_at: None,
            options,
            error: None,
        }
    }

    /// Create with a specific identifier (for tests)
    pub fn with_id(id: impl Into<String>, folder_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(folder_path, ProcessingOptions::default())
        }
    }

    /// Update the status, stamping `completed_at` on the first terminal
    /// transition
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        if status.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(now_ms());
        }
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
