//! AppState - actor that owns the queue and task containers
//!
//! Processes commands via channels, so every operation is atomic with
//! respect to every other and no caller ever observes a half-applied
//! mutation.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{Task, TaskStatus};

use super::messages::{StateCommand, StateError, StateResponse};

/// Handle to send commands to the state actor
///
/// Cheap to clone; construct once at startup and pass a clone to every
/// component that needs state access.
#[derive(Debug, Clone)]
pub struct AppState {
    tx: mpsc::Sender<StateCommand>,
}

impl AppState {
    /// Spawn the state actor and return a handle to it
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(Containers::default(), rx));
        debug!("state actor spawned");
        Self { tx }
    }

    /// Append `path` to the pending queue unless it is already present.
    /// Idempotent under repeated identical calls.
    pub async fn enqueue(&self, path: impl Into<String>) -> StateResponse<()> {
        let path = path.into();
        debug!(%path, "enqueue: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Enqueue { path, reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Point-in-time snapshot of the pending queue, in insertion order
    pub async fn get_queue(&self) -> StateResponse<Vec<String>> {
        debug!("get_queue: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::GetQueue { reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Atomically take the whole pending queue, leaving it empty
    pub async fn drain_queue(&self) -> StateResponse<Vec<String>> {
        debug!("drain_queue: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::DrainQueue { reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Empty the pending queue unconditionally
    pub async fn clear_queue(&self) -> StateResponse<()> {
        debug!("clear_queue: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::ClearQueue { reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Insert the record under its identifier, or replace the existing one
    pub async fn upsert_task(&self, task: Task) -> StateResponse<()> {
        debug!(task_id = %task.id, "upsert_task: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::UpsertTask { task, reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Update the status of an active task.
    ///
    /// Best effort by contract: an unknown identifier is silently ignored,
    /// because the caller may race with the task's own terminal transition.
    /// Omitted fields keep their previous value. A terminal status moves the
    /// record from the active map into history as part of the same step.
    pub async fn set_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: Option<String>,
        progress: Option<u8>,
        error: Option<String>,
    ) -> StateResponse<()> {
        debug!(%task_id, %status, "set_task_status: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::SetTaskStatus {
                task_id: task_id.to_string(),
                status,
                message,
                progress,
                error,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Look up a task by identifier, searching the active map first and the
    /// history (newest first) second
    pub async fn get_task(&self, task_id: &str) -> StateResponse<Option<Task>> {
        debug!(%task_id, "get_task: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::GetTask {
                task_id: task_id.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Snapshot of the active (non-terminal) records, ordered by creation
    pub async fn list_tasks(&self) -> StateResponse<Vec<Task>> {
        debug!("list_tasks: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::ListTasks { reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Empty both the active map and the history
    pub async fn clear_tasks(&self) -> StateResponse<()> {
        debug!("clear_tasks: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::ClearTasks { reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)
    }

    /// Shutdown the state actor
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelClosed)
    }
}

/// The three shared containers, exclusively owned by the actor
#[derive(Debug, Default)]
struct Containers {
    /// Pending folder paths, duplicate-free, insertion-ordered
    queue: Vec<String>,
    /// Active (non-terminal) tasks by identifier
    current: HashMap<String, Task>,
    /// Finished tasks, append-only
    history: Vec<Task>,
}

/// The actor loop that owns the containers and processes commands
async fn actor_loop(mut state: Containers, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("state actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::Enqueue { path, reply } => {
                if !state.queue.contains(&path) {
                    state.queue.push(path);
                }
                let _ = reply.send(());
            }

            StateCommand::GetQueue { reply } => {
                let _ = reply.send(state.queue.clone());
            }

            StateCommand::DrainQueue { reply } => {
                let _ = reply.send(std::mem::take(&mut state.queue));
            }

            StateCommand::ClearQueue { reply } => {
                state.queue.clear();
                let _ = reply.send(());
            }

            StateCommand::UpsertTask { task, reply } => {
                state.current.insert(task.id.clone(), task);
                let _ = reply.send(());
            }

            StateCommand::SetTaskStatus {
                task_id,
                status,
                message,
                progress,
                error,
                reply,
            } => {
                if let Some(task) = state.current.get_mut(&task_id) {
                    task.set_status(status);
                    if let Some(message) = message {
                        task.message = message;
                    }
                    if let Some(progress) = progress {
                        task.progress = progress;
                    }
                    if let Some(error) = error {
                        task.error = Some(error);
                    }
                    if status.is_terminal() {
                        // Same step as the update: no observer ever sees the
                        // record in both containers or in neither.
                        if let Some(task) = state.current.remove(&task_id) {
                            state.history.push(task);
                        }
                    }
                }
                // Unknown identifier: best-effort contract, not an error.
                let _ = reply.send(());
            }

            StateCommand::GetTask { task_id, reply } => {
                let found = state.current.get(&task_id).cloned().or_else(|| {
                    state.history.iter().rev().find(|t| t.id == task_id).cloned()
                });
                let _ = reply.send(found);
            }

            StateCommand::ListTasks { reply } => {
                let mut tasks: Vec<Task> = state.current.values().cloned().collect();
                tasks.sort_by(|a, b| {
                    a.created_at
                        .cmp(&b.created_at)
                        .then_with(|| a.id.cmp(&b.id))
                });
                let _ = reply.send(tasks);
            }

            StateCommand::ClearTasks { reply } => {
                state.current.clear();
                state.history.clear();
                let _ = reply.send(());
            }

            StateCommand::Shutdown => {
                info!("state actor shutting down");
                break;
            }
        }
    }

    debug!("state actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProcessingOptions;

    #[tokio::test]
    async fn test_enqueue_is_idempotent_and_ordered() {
        let state = AppState::spawn();

        state.enqueue("/photos/a").await.unwrap();
        state.enqueue("/photos/b").await.unwrap();
        state.enqueue("/photos/a").await.unwrap();

        let queue = state.get_queue().await.unwrap();
        assert_eq!(queue, vec!["/photos/a", "/photos/b"]);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_queue() {
        let state = AppState::spawn();

        state.enqueue("/photos/a").await.unwrap();
        state.clear_queue().await.unwrap();

        assert!(state.get_queue().await.unwrap().is_empty());

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_queue_returns_batch_and_empties() {
        let state = AppState::spawn();

        state.enqueue("/photos/a").await.unwrap();
        state.enqueue("/photos/b").await.unwrap();

        let batch = state.drain_queue().await.unwrap();
        assert_eq!(batch, vec!["/photos/a", "/photos/b"]);
        assert!(state.get_queue().await.unwrap().is_empty());

        // Draining an empty queue yields an empty batch
        assert!(state.drain_queue().await.unwrap().is_empty());

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_and_list() {
        let state = AppState::spawn();

        let task = Task::with_id("t-1", "/photos/a");
        state.upsert_task(task).await.unwrap();

        let tasks = state.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "t-1");
        assert_eq!(tasks[0].status, TaskStatus::Pending);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_record() {
        let state = AppState::spawn();

        state.upsert_task(Task::with_id("t-1", "/photos/a")).await.unwrap();

        let mut replacement = Task::with_id("t-1", "/photos/b");
        replacement.progress = 42;
        state.upsert_task(replacement).await.unwrap();

        let tasks = state.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].folder_path, "/photos/b");
        assert_eq!(tasks[0].progress, 42);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_task_status_partial_update() {
        let state = AppState::spawn();

        state.upsert_task(Task::with_id("t-1", "/photos/a")).await.unwrap();

        // Only supplied fields overwrite
        state
            .set_task_status("t-1", TaskStatus::Running, None, Some(40), None)
            .await
            .unwrap();

        let task = state.get_task("t-1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.progress, 40);
        assert_eq!(task.message, "Queued");
        assert!(task.error.is_none());

        // Message updates, progress retained
        state
            .set_task_status("t-1", TaskStatus::Running, Some("Halfway".to_string()), None, None)
            .await
            .unwrap();

        let task = state.get_task("t-1").await.unwrap().unwrap();
        assert_eq!(task.message, "Halfway");
        assert_eq!(task.progress, 40);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_terminal_status_moves_task_to_history() {
        let state = AppState::spawn();

        state.upsert_task(Task::with_id("t-1", "/photos/a")).await.unwrap();
        state
            .set_task_status("t-1", TaskStatus::Done, Some("Finished".to_string()), Some(100), None)
            .await
            .unwrap();

        // No longer active, but still resolvable by id
        assert!(state.list_tasks().await.unwrap().is_empty());
        let task = state.get_task("t-1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.progress, 100);
        assert!(task.completed_at.is_some());

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_moves_task_to_history() {
        let state = AppState::spawn();

        state.upsert_task(Task::with_id("t-1", "/photos/a")).await.unwrap();
        state
            .set_task_status(
                "t-1",
                TaskStatus::Error,
                None,
                None,
                Some("engine crashed".to_string()),
            )
            .await
            .unwrap();

        assert!(state.list_tasks().await.unwrap().is_empty());
        let task = state.get_task("t-1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error.as_deref(), Some("engine crashed"));

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_task_status_unknown_id_is_noop() {
        let state = AppState::spawn();

        // Does not error, does not create a record
        state
            .set_task_status("missing", TaskStatus::Done, None, Some(100), None)
            .await
            .unwrap();

        assert!(state.list_tasks().await.unwrap().is_empty());
        assert!(state.get_task("missing").await.unwrap().is_none());

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_terminal_update_on_history_record_is_noop() {
        let state = AppState::spawn();

        state.upsert_task(Task::with_id("t-1", "/photos/a")).await.unwrap();
        state
            .set_task_status("t-1", TaskStatus::Error, None, None, Some("boom".to_string()))
            .await
            .unwrap();

        // A late racing write targets an id that is no longer active
        state
            .set_task_status("t-1", TaskStatus::Done, Some("Finished".to_string()), Some(100), None)
            .await
            .unwrap();

        let task = state.get_task("t-1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error.as_deref(), Some("boom"));

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_tasks_excludes_history() {
        let state = AppState::spawn();

        state.upsert_task(Task::with_id("t-1", "/photos/a")).await.unwrap();
        state.upsert_task(Task::with_id("t-2", "/photos/b")).await.unwrap();
        state
            .set_task_status("t-1", TaskStatus::Done, None, Some(100), None)
            .await
            .unwrap();

        let tasks = state.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "t-2");

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_tasks_empties_active_and_history() {
        let state = AppState::spawn();

        state.upsert_task(Task::with_id("t-1", "/photos/a")).await.unwrap();
        state.upsert_task(Task::with_id("t-2", "/photos/b")).await.unwrap();
        state
            .set_task_status("t-1", TaskStatus::Done, None, Some(100), None)
            .await
            .unwrap();

        state.clear_tasks().await.unwrap();

        assert!(state.list_tasks().await.unwrap().is_empty());
        assert!(state.get_task("t-1").await.unwrap().is_none());
        assert!(state.get_task("t-2").await.unwrap().is_none());

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_get_task_prefers_active_record() {
        let state = AppState::spawn();

        let mut active = Task::with_id("t-1", "/photos/a");
        active.progress = 10;
        state.upsert_task(active).await.unwrap();

        let task = state.get_task("t-1").await.unwrap().unwrap();
        assert_eq!(task.progress, 10);
        assert_eq!(task.status, TaskStatus::Pending);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_operations_after_shutdown_fail() {
        let state = AppState::spawn();
        state.shutdown().await.unwrap();

        // Give the actor time to drain its mailbox and stop
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let result = state.enqueue("/photos/a").await;
        assert!(matches!(result, Err(StateError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_concurrent_enqueues_never_duplicate() {
        let state = AppState::spawn();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                state.enqueue("/photos/same").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(state.get_queue().await.unwrap().len(), 1);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_new_tasks_use_processing_options() {
        let state = AppState::spawn();

        let options = ProcessingOptions {
            include_excluded: true,
            joint_mode: crate::domain::JointMode::Move,
            post_validate: true,
        };
        state.upsert_task(Task::new("/photos/a", options)).await.unwrap();

        let tasks = state.list_tasks().await.unwrap();
        assert_eq!(tasks[0].options, options);

        state.shutdown().await.unwrap();
    }
}
