//! Request/response bodies for the HTTP API

use serde::{Deserialize, Serialize};

use crate::domain::{JointMode, ProcessingOptions, Task, TaskStatus};
use crate::files::FolderEntry;

/// Body of `POST /api/queue`
#[derive(Debug, Deserialize)]
pub struct QueueAddRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

/// Generic success acknowledgement
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Body of `GET /api/queue`
#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub queue: Vec<String>,
    pub total: usize,
}

/// Query parameters of `POST /api/process-queue`
#[derive(Debug, Default, Deserialize)]
pub struct ProcessParams {
    #[serde(default, rename = "includeExcluded")]
    pub include_excluded: bool,
    #[serde(default, rename = "jointMode")]
    pub joint_mode: JointMode,
    #[serde(default, rename = "postValidate")]
    pub post_validate: bool,
}

impl From<ProcessParams> for ProcessingOptions {
    fn from(params: ProcessParams) -> Self {
        Self {
            include_excluded: params.include_excluded,
            joint_mode: params.joint_mode,
            post_validate: params.post_validate,
        }
    }
}

/// Body of `POST /api/process-queue`
#[derive(Debug, Serialize)]
pub struct ProcessQueueResponse {
    pub message: String,
    pub task_ids: Vec<String>,
}

/// One task in API responses
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            status: task.status,
            progress: task.progress,
            message: task.message,
            created_at: task.created_at,
            completed_at: task.completed_at,
            error: task.error,
        }
    }
}

/// Query parameters of `GET /api/folder`
#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub path: String,
}

/// Body of `GET /api/folder`
#[derive(Debug, Serialize)]
pub struct FolderContentsResponse {
    pub path: String,
    pub contents: Vec<FolderEntry>,
    pub image_count: usize,
}
