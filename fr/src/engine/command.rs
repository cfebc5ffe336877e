//! Subprocess-backed clustering engine
//!
//! Adapter for a legacy clustering binary that runs out of process. The
//! adapter keeps the engine-side task bookkeeping that in-process legacy
//! code would otherwise do itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::{ProcessingOptions, TaskStatus};

use super::{ClusteringEngine, EngineError, LegacyTaskEntry, SharedLegacyTasks};

/// Engine that shells out to a configured executable per task
pub struct CommandEngine {
    command: String,
    tasks: SharedLegacyTasks,
}

impl CommandEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Engine from configuration; `None` when no command is configured
    pub fn from_config(config: &EngineConfig) -> Option<Arc<dyn ClusteringEngine>> {
        let command = config.command.as_deref()?;
        info!(%command, "using external clustering engine");
        Some(Arc::new(Self::new(command)))
    }
}

#[async_trait]
impl ClusteringEngine for CommandEngine {
    fn tasks(&self) -> SharedLegacyTasks {
        Arc::clone(&self.tasks)
    }

    async fn process_folder(
        &self,
        task_id: &str,
        folder_path: &str,
        options: &ProcessingOptions,
    ) -> Result<(), EngineError> {
        {
            let mut tasks = self.tasks.lock().await;
            let entry = tasks
                .entry(task_id.to_string())
                .or_insert_with(|| LegacyTaskEntry::new(task_id, folder_path, *options));
            entry.status = Some(TaskStatus::Running);
            entry.progress = Some(0);
            entry.message = Some(format!("Clustering {folder_path}"));
        }

        let mut cmd = tokio::process::Command::new(&self.command);
        cmd.arg(folder_path).arg("--task-id").arg(task_id);
        if options.include_excluded {
            cmd.arg("--include-excluded");
        }
        cmd.arg("--joint-mode").arg(options.joint_mode.to_string());
        if options.post_validate {
            cmd.arg("--post-validate");
        }

        debug!(command = %self.command, %folder_path, "spawning engine process");
        let output = cmd.output().await?;

        let mut tasks = self.tasks.lock().await;
        let entry = tasks.get_mut(task_id);

        if output.status.success() {
            if let Some(entry) = entry {
                entry.status = Some(TaskStatus::Done);
                entry.progress = Some(100);
                entry.message = Some("Clustering finished".to_string());
            }
            Ok(())
        } else {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if let Some(entry) = entry {
                entry.status = Some(TaskStatus::Error);
                entry.error = Some(format!("exit code {code}"));
            }
            Err(EngineError::Failed { code, stderr })
        }
    }
}
