//! Clustering engine contract
//!
//! The actual face-detection/clustering implementation lives outside this
//! crate. It is consumed through [`ClusteringEngine`]: the engine processes
//! a folder and keeps its own task bookkeeping in a map it exposes, knowing
//! nothing about the canonical [`AppState`]. [`EngineBridge`] reconciles the
//! two after every invocation.
//!
//! [`AppState`]: crate::state::AppState

mod bridge;
mod command;

pub use bridge::EngineBridge;
pub use command::CommandEngine;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{ProcessingOptions, TaskStatus, now_ms};
use crate::state::StateError;

/// Errors from engine invocation
#[derive(Debug, Error)]
pub enum EngineError {
    /// No engine is wired into this process
    #[error("legacy engine unavailable")]
    Unavailable,

    #[error("engine exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("failed to launch engine: {0}")]
    Launch(#[from] std::io::Error),

    #[error(transparent)]
    State(#[from] StateError),
}

/// The engine's own record of one task
///
/// Every field the reconciliation step reads is optional; defaults apply
/// when the engine left it unset.
#[derive(Debug, Clone)]
pub struct LegacyTaskEntry {
    pub task_id: String,
    pub folder_path: String,
    pub created_at: i64,
    pub options: ProcessingOptions,
    pub status: Option<TaskStatus>,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl LegacyTaskEntry {
    /// Fresh entry with no status recorded yet
    pub fn new(
        task_id: impl Into<String>,
        folder_path: impl Into<String>,
        options: ProcessingOptions,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            folder_path: folder_path.into(),
            created_at: now_ms(),
            options,
            status: None,
            progress: None,
            message: None,
            error: None,
        }
    }
}

/// The task-state structure an engine reads and writes directly
pub type SharedLegacyTasks = Arc<Mutex<HashMap<String, LegacyTaskEntry>>>;

/// Call contract for the external clustering engine
#[async_trait]
pub trait ClusteringEngine: Send + Sync {
    /// The engine's own task-state structure, keyed by task identifier
    fn tasks(&self) -> SharedLegacyTasks;

    /// Process one folder; status side effects land in [`tasks`]
    ///
    /// [`tasks`]: ClusteringEngine::tasks
    async fn process_folder(
        &self,
        task_id: &str,
        folder_path: &str,
        options: &ProcessingOptions,
    ) -> Result<(), EngineError>;
}
