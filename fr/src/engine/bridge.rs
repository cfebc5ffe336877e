//! State bridge between the canonical manager and the engine's task map
//!
//! The engine tracks tasks in its own structure. Before an invocation the
//! bridge copies the canonical record into that structure; afterwards it
//! copies the engine's final state back, whatever the invocation outcome
//! was, so a task is never left stale on a failure path.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{ProcessingOptions, TaskStatus};
use crate::state::AppState;

use super::{ClusteringEngine, EngineError, LegacyTaskEntry};

/// Adapter wiring the canonical [`AppState`] to a [`ClusteringEngine`]
pub struct EngineBridge {
    engine: Option<Arc<dyn ClusteringEngine>>,
    state: AppState,
}

impl EngineBridge {
    pub fn new(engine: Option<Arc<dyn ClusteringEngine>>, state: AppState) -> Self {
        Self { engine, state }
    }

    /// Whether an engine is wired into this process
    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    /// Run the engine for one task and reconcile its state back into the
    /// canonical manager.
    ///
    /// Reconciliation runs whether the invocation succeeded or failed; an
    /// invocation error propagates only after reconciliation was attempted.
    pub async fn run(
        &self,
        task_id: &str,
        folder_path: &str,
        options: &ProcessingOptions,
    ) -> Result<(), EngineError> {
        let Some(engine) = self.engine.as_ref() else {
            return Err(EngineError::Unavailable);
        };

        self.snapshot_into(engine.as_ref(), task_id).await?;

        let outcome = engine.process_folder(task_id, folder_path, options).await;

        let reconciled = self.absorb_from(engine.as_ref(), task_id).await;
        outcome?;
        reconciled
    }

    /// Copy the canonical record for `task_id` into the engine's task map,
    /// so the engine sees the task it is asked to process
    async fn snapshot_into(
        &self,
        engine: &dyn ClusteringEngine,
        task_id: &str,
    ) -> Result<(), EngineError> {
        let task = self
            .state
            .list_tasks()
            .await?
            .into_iter()
            .find(|t| t.id == task_id);

        let Some(task) = task else {
            debug!(%task_id, "no active record to snapshot");
            return Ok(());
        };

        let entry = LegacyTaskEntry {
            task_id: task.id.clone(),
            folder_path: task.folder_path.clone(),
            created_at: task.created_at,
            options: task.options,
            status: Some(task.status),
            progress: Some(task.progress),
            message: Some(task.message.clone()),
            error: task.error.clone(),
        };

        let tasks = engine.tasks();
        let mut tasks = tasks.lock().await;
        tasks.insert(task.id, entry);
        Ok(())
    }

    /// Copy the engine's final record back into the canonical manager.
    ///
    /// An absent record is ambiguous between "never started" and "finished
    /// without bookkeeping"; it is treated as an implicit success, because
    /// leaving the task non-terminal forever would be worse.
    async fn absorb_from(
        &self,
        engine: &dyn ClusteringEngine,
        task_id: &str,
    ) -> Result<(), EngineError> {
        let tasks = engine.tasks();
        let entry = tasks.lock().await.get(task_id).cloned();

        match entry {
            Some(entry) => {
                self.state
                    .set_task_status(
                        task_id,
                        entry.status.unwrap_or(TaskStatus::Error),
                        Some(entry.message.unwrap_or_else(|| "Completed".to_string())),
                        Some(entry.progress.unwrap_or(100)),
                        entry.error,
                    )
                    .await?;
            }
            None => {
                warn!(%task_id, "engine left no record, assuming completion");
                self.state
                    .set_task_status(
                        task_id,
                        TaskStatus::Done,
                        Some("Completed".to_string()),
                        Some(100),
                        None,
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::domain::Task;
    use crate::engine::SharedLegacyTasks;

    /// What a test engine does when invoked
    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        /// Read its own entry (snapshot must be visible), record completion
        RecordDone,
        /// Drop its entry, like an engine that crashed before its first write
        RecordNothing,
        /// Record a partial update, then fail
        FailAfterPartial,
    }

    struct TestEngine {
        tasks: SharedLegacyTasks,
        behavior: Behavior,
    }

    impl TestEngine {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                tasks: Arc::new(Mutex::new(HashMap::new())),
                behavior,
            })
        }
    }

    #[async_trait]
    impl ClusteringEngine for TestEngine {
        fn tasks(&self) -> SharedLegacyTasks {
            Arc::clone(&self.tasks)
        }

        async fn process_folder(
            &self,
            task_id: &str,
            _folder_path: &str,
            _options: &ProcessingOptions,
        ) -> Result<(), EngineError> {
            let mut tasks = self.tasks.lock().await;
            match self.behavior {
                Behavior::RecordDone => {
                    // The bridge must have snapshotted the record first
                    let entry = tasks.get_mut(task_id).ok_or(EngineError::Failed {
                        code: -1,
                        stderr: "task not in engine state".to_string(),
                    })?;
                    entry.status = Some(TaskStatus::Done);
                    entry.progress = Some(100);
                    entry.message = Some("Clustering finished".to_string());
                    Ok(())
                }
                Behavior::RecordNothing => {
                    tasks.remove(task_id);
                    Ok(())
                }
                Behavior::FailAfterPartial => {
                    if let Some(entry) = tasks.get_mut(task_id) {
                        entry.status = Some(TaskStatus::Running);
                        entry.progress = Some(40);
                    }
                    Err(EngineError::Failed {
                        code: 1,
                        stderr: "model crashed".to_string(),
                    })
                }
            }
        }
    }

    async fn state_with_task(task_id: &str) -> AppState {
        let state = AppState::spawn();
        state
            .upsert_task(Task::with_id(task_id, "/photos/a"))
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_reconciliation_absorbs_recorded_completion() {
        let state = state_with_task("t-1").await;
        let engine = TestEngine::new(Behavior::RecordDone);
        let bridge = EngineBridge::new(Some(engine), state.clone());

        bridge
            .run("t-1", "/photos/a", &ProcessingOptions::default())
            .await
            .unwrap();

        // Terminal and moved out of the active set
        assert!(state.list_tasks().await.unwrap().is_empty());
        let task = state.get_task("t-1").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.progress, 100);
        assert_eq!(task.message, "Clustering finished");

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_engine_record_is_implicit_success() {
        let state = state_with_task("t-2").await;
        let engine = TestEngine::new(Behavior::RecordNothing);
        let bridge = EngineBridge::new(Some(engine), state.clone());

        bridge
            .run("t-2", "/photos/a", &ProcessingOptions::default())
            .await
            .unwrap();

        let task = state.get_task("t-2").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.progress, 100);
        assert_eq!(task.message, "Completed");

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_partial_state_absorbed_before_error_propagates() {
        let state = state_with_task("t-3").await;
        let engine = TestEngine::new(Behavior::FailAfterPartial);
        let bridge = EngineBridge::new(Some(engine), state.clone());

        let result = bridge
            .run("t-3", "/photos/a", &ProcessingOptions::default())
            .await;
        assert!(matches!(result, Err(EngineError::Failed { code: 1, .. })));

        // The engine's partial state was reflected back before the error
        // reached us; the task is still active.
        let task = state.get_task("t-3").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.progress, 40);
        assert_eq!(state.list_tasks().await.unwrap().len(), 1);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unavailable_engine_fails_without_side_effects() {
        let state = state_with_task("t-4").await;
        let bridge = EngineBridge::new(None, state.clone());

        let result = bridge
            .run("t-4", "/photos/a", &ProcessingOptions::default())
            .await;
        assert!(matches!(result, Err(EngineError::Unavailable)));

        // Canonical record untouched
        let task = state.get_task("t-4").await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_carries_canonical_fields() {
        let state = AppState::spawn();
        let mut task = Task::with_id("t-5", "/photos/b");
        task.progress = 7;
        task.message = "Warming up".to_string();
        state.upsert_task(task).await.unwrap();

        let engine = TestEngine::new(Behavior::FailAfterPartial);
        let tasks = engine.tasks();
        let bridge = EngineBridge::new(Some(engine), state.clone());

        let _ = bridge
            .run("t-5", "/photos/b", &ProcessingOptions::default())
            .await;

        let entry = tasks.lock().await.get("t-5").cloned().unwrap();
        assert_eq!(entry.folder_path, "/photos/b");
        // Snapshot preceded the engine's own writes
        assert_eq!(entry.message.as_deref(), Some("Warming up"));

        state.shutdown().await.unwrap();
    }
}
