//! Route filters
//!
//! Composition only; behavior lives in the handlers.

use std::sync::Arc;

use warp::{Filter, Reply, filters::BoxedFilter};

use crate::config::Config;
use crate::engine::EngineBridge;
use crate::state::AppState;

use super::handlers;
use super::schema::{FolderQuery, ProcessParams};

/// All routes: the /api surface plus static content
pub fn create_filters(
    config: &Config,
    state: AppState,
    bridge: Arc<EngineBridge>,
) -> BoxedFilter<(impl Reply + use<>,)> {
    let api = api_filters(config, state, bridge);

    let static_dir = config.server.static_dir.clone();
    let static_files = warp::path("static").and(warp::fs::dir(static_dir.clone()));
    let index = warp::get()
        .and(warp::path::end())
        .and(warp::fs::file(static_dir.join("index.html")));
    let index_fallback = warp::get()
        .and(warp::path::end())
        .map(|| warp::reply::html("<h1>FaceRelis</h1><p>Application is starting...</p>"));

    api.or(static_files).or(index).or(index_fallback).boxed()
}

fn api_filters(
    config: &Config,
    state: AppState,
    bridge: Arc<EngineBridge>,
) -> BoxedFilter<(impl Reply + use<>,)> {
    let with_state = {
        let state = state.clone();
        warp::any().map(move || state.clone())
    };
    let with_bridge = warp::any().map(move || Arc::clone(&bridge));
    let scan = Arc::new(config.scan.clone());
    let with_scan = warp::any().map(move || Arc::clone(&scan));

    // POST /api/queue (and alias /api/queue/add)
    let queue_add = warp::post()
        .and(warp::path("queue"))
        .and(
            warp::path::end()
                .or(warp::path("add").and(warp::path::end()))
                .unify(),
        )
        .and(warp::body::json())
        .and(with_state.clone())
        .and(with_scan.clone())
        .and_then(handlers::add_to_queue);

    // GET /api/queue
    let queue_get = warp::get()
        .and(warp::path("queue"))
        .and(warp::path::end())
        .and(with_state.clone())
        .and_then(handlers::get_queue);

    // DELETE /api/queue
    let queue_clear = warp::delete()
        .and(warp::path("queue"))
        .and(warp::path::end())
        .and(with_state.clone())
        .and_then(handlers::clear_queue);

    // POST /api/process-queue (and alias /api/process)
    let process = warp::post()
        .and(
            warp::path("process-queue")
                .or(warp::path("process"))
                .unify(),
        )
        .and(warp::path::end())
        .and(warp::query::<ProcessParams>())
        .and(with_state.clone())
        .and(with_bridge)
        .and_then(handlers::process_queue);

    // GET /api/task/list
    let task_list = warp::get()
        .and(warp::path("task"))
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(with_state.clone())
        .and_then(handlers::list_tasks);

    // POST /api/task/clear
    let task_clear = warp::post()
        .and(warp::path("task"))
        .and(warp::path("clear"))
        .and(warp::path::end())
        .and(with_state.clone())
        .and_then(handlers::clear_tasks);

    // GET /api/task/{id} - must come after the fixed task segments
    let task_get = warp::get()
        .and(warp::path("task"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with_state.clone())
        .and_then(handlers::get_task);

    // GET /api/drives
    let drives = warp::get()
        .and(warp::path("drives"))
        .and(warp::path::end())
        .and_then(handlers::get_drives);

    // GET /api/folder
    let folder = warp::get()
        .and(warp::path("folder"))
        .and(warp::path::end())
        .and(warp::query::<FolderQuery>())
        .and(with_scan)
        .and_then(handlers::get_folder);

    warp::path("api")
        .and(
            queue_add
                .or(queue_get)
                .or(queue_clear)
                .or(process)
                .or(task_list)
                .or(task_clear)
                .or(task_get)
                .or(drives)
                .or(folder),
        )
        .boxed()
}
