//! Request handlers
//!
//! Handlers validate input, talk to the state manager, and schedule
//! background processing. Processing is fire-and-forget: the reply carries
//! the generated task identifiers and callers poll `/api/task/list`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};
use warp::{Rejection, Reply};

use crate::config::ScanConfig;
use crate::domain::{ProcessingOptions, Task, TaskStatus};
use crate::engine::EngineBridge;
use crate::files;
use crate::state::{AppState, StateError};

use super::reject::ApiError;
use super::schema::{
    AckResponse, FolderContentsResponse, FolderQuery, ProcessParams, ProcessQueueResponse,
    QueueAddRequest, QueueResponse, TaskResponse,
};

fn state_err(err: StateError) -> Rejection {
    ApiError::State(err).reject()
}

/// `POST /api/queue` - add a folder to the processing queue
pub(crate) async fn add_to_queue(
    req: QueueAddRequest,
    state: AppState,
    scan: Arc<ScanConfig>,
) -> Result<impl Reply, Rejection> {
    let folder = PathBuf::from(&req.path);
    if !folder.exists() {
        return Err(ApiError::NotFound("Folder not found".to_string()).reject());
    }
    if !folder.is_dir() {
        return Err(ApiError::BadRequest("Path is not a directory".to_string()).reject());
    }

    state.enqueue(req.path.clone()).await.map_err(state_err)?;

    let images = {
        let folder = folder.clone();
        let extensions = scan.supported_extensions.clone();
        tokio::task::spawn_blocking(move || files::count_images(&folder, req.recursive, &extensions))
            .await
            .map_err(|err| ApiError::Internal(err.to_string()).reject())?
    };

    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| req.path.clone());
    info!(path = %req.path, images, "folder queued");

    Ok(warp::reply::json(&AckResponse::with_message(format!(
        "Added {name} to queue ({images} images)"
    ))))
}

/// `GET /api/queue` - snapshot of the pending queue
pub(crate) async fn get_queue(state: AppState) -> Result<impl Reply, Rejection> {
    let queue = state.get_queue().await.map_err(state_err)?;
    Ok(warp::reply::json(&QueueResponse {
        total: queue.len(),
        queue,
    }))
}

/// `DELETE /api/queue` - empty the pending queue
pub(crate) async fn clear_queue(state: AppState) -> Result<impl Reply, Rejection> {
    state.clear_queue().await.map_err(state_err)?;
    Ok(warp::reply::json(&AckResponse::ok()))
}

/// `POST /api/process-queue` - drain the queue into a batch of tasks
///
/// One task per queued folder, each scheduled independently.
pub(crate) async fn process_queue(
    params: ProcessParams,
    state: AppState,
    bridge: Arc<EngineBridge>,
) -> Result<impl Reply, Rejection> {
    let batch = state.drain_queue().await.map_err(state_err)?;
    if batch.is_empty() {
        return Err(ApiError::BadRequest("Queue is empty".to_string()).reject());
    }

    let options = ProcessingOptions::from(params);
    let mut task_ids = Vec::with_capacity(batch.len());

    for folder_path in batch {
        let task = Task::new(folder_path.clone(), options);
        let task_id = task.id.clone();
        state.upsert_task(task).await.map_err(state_err)?;

        tokio::spawn(run_task(
            state.clone(),
            Arc::clone(&bridge),
            task_id.clone(),
            folder_path,
            options,
        ));
        task_ids.push(task_id);
    }

    info!(count = task_ids.len(), "queue processing started");
    Ok(warp::reply::json(&ProcessQueueResponse {
        message: "Processing started".to_string(),
        task_ids,
    }))
}

/// Background runner for one task
///
/// Errors end up on the task record; there is nobody to return them to.
async fn run_task(
    state: AppState,
    bridge: Arc<EngineBridge>,
    task_id: String,
    folder_path: String,
    options: ProcessingOptions,
) {
    if let Err(err) = state
        .set_task_status(
            &task_id,
            TaskStatus::Running,
            Some("Processing started".to_string()),
            Some(1),
            None,
        )
        .await
    {
        error!(%task_id, %err, "failed to mark task running");
        return;
    }

    match bridge.run(&task_id, &folder_path, &options).await {
        Ok(()) => {
            // The bridge normally lands the terminal status during
            // reconciliation; this write is a no-op then.
            let _ = state
                .set_task_status(
                    &task_id,
                    TaskStatus::Done,
                    Some("Finished".to_string()),
                    Some(100),
                    None,
                )
                .await;
        }
        Err(err) => {
            error!(%task_id, %err, "task failed");
            let _ = state
                .set_task_status(
                    &task_id,
                    TaskStatus::Error,
                    Some("Processing failed".to_string()),
                    None,
                    Some(err.to_string()),
                )
                .await;
        }
    }
}

/// `GET /api/task/list` - all active tasks
pub(crate) async fn list_tasks(state: AppState) -> Result<impl Reply, Rejection> {
    let tasks = state.list_tasks().await.map_err(state_err)?;
    let tasks: Vec<TaskResponse> = tasks.into_iter().map(TaskResponse::from).collect();
    Ok(warp::reply::json(&tasks))
}

/// `GET /api/task/{id}` - one task, active or historical
pub(crate) async fn get_task(task_id: String, state: AppState) -> Result<impl Reply, Rejection> {
    match state.get_task(&task_id).await.map_err(state_err)? {
        Some(task) => Ok(warp::reply::json(&TaskResponse::from(task))),
        None => Err(ApiError::NotFound("Task not found".to_string()).reject()),
    }
}

/// `POST /api/task/clear` - drop all task records, active and historical
pub(crate) async fn clear_tasks(state: AppState) -> Result<impl Reply, Rejection> {
    state.clear_tasks().await.map_err(state_err)?;
    Ok(warp::reply::json(&AckResponse::ok()))
}

/// `GET /api/drives` - browse roots
pub(crate) async fn get_drives() -> Result<impl Reply, Rejection> {
    let drives = tokio::task::spawn_blocking(files::logical_drives)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()).reject())?;
    Ok(warp::reply::json(&drives))
}

/// `GET /api/folder` - list one folder's direct children
pub(crate) async fn get_folder(
    query: FolderQuery,
    scan: Arc<ScanConfig>,
) -> Result<impl Reply, Rejection> {
    let folder = PathBuf::from(&query.path);
    if !folder.exists() {
        return Err(ApiError::NotFound("Folder not found".to_string()).reject());
    }
    if !folder.is_dir() {
        return Err(ApiError::BadRequest("Path is not a directory".to_string()).reject());
    }

    let extensions = scan.supported_extensions.clone();
    let contents = tokio::task::spawn_blocking(move || files::folder_contents(&folder))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()).reject())?
        .map_err(|err| ApiError::Internal(err.to_string()).reject())?;

    let image_count = contents
        .iter()
        .filter(|entry| !entry.is_directory)
        .filter(|entry| files::is_supported_image(Path::new(&entry.path), &extensions))
        .count();

    Ok(warp::reply::json(&FolderContentsResponse {
        path: query.path,
        contents,
        image_count,
    }))
}
