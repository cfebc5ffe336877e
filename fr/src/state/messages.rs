//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Task, TaskStatus};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    /// The actor task is gone; only happens during shutdown
    #[error("state manager unavailable")]
    ChannelClosed,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the [`AppState`] actor
///
/// [`AppState`]: super::AppState
#[derive(Debug)]
pub enum StateCommand {
    /// Append a folder to the pending queue unless already present
    Enqueue {
        path: String,
        reply: oneshot::Sender<()>,
    },

    /// Snapshot of the pending queue
    GetQueue {
        reply: oneshot::Sender<Vec<String>>,
    },

    /// Take the whole pending queue, leaving it empty
    DrainQueue {
        reply: oneshot::Sender<Vec<String>>,
    },

    /// Empty the pending queue unconditionally
    ClearQueue {
        reply: oneshot::Sender<()>,
    },

    /// Insert or replace a task record under its identifier
    UpsertTask {
        task: Task,
        reply: oneshot::Sender<()>,
    },

    /// Partial status update; terminal statuses move the record to history
    SetTaskStatus {
        task_id: String,
        status: TaskStatus,
        message: Option<String>,
        progress: Option<u8>,
        error: Option<String>,
        reply: oneshot::Sender<()>,
    },

    /// Point lookup across the active map and history
    GetTask {
        task_id: String,
        reply: oneshot::Sender<Option<Task>>,
    },

    /// Snapshot of the active (non-terminal) records
    ListTasks {
        reply: oneshot::Sender<Vec<Task>>,
    },

    /// Empty both the active map and history
    ClearTasks {
        reply: oneshot::Sender<()>,
    },

    /// Stop the actor
    Shutdown,
}
