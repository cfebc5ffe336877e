//! FaceRelis backend
//!
//! Thin HTTP backend for the FaceRelis desktop photo-clustering tool. It
//! browses the local filesystem, queues folders for processing, and forwards
//! processing to an external clustering engine while tracking task state in
//! process memory.
//!
//! All state is lost on restart; running more than one worker process
//! requires an external shared store instead of [`state::AppState`].
//!
//! # Modules
//!
//! - [`state`] - the canonical task/queue state manager (actor + handle)
//! - [`engine`] - clustering engine contract and state bridge
//! - [`server`] - warp HTTP surface
//! - [`files`] - drive/folder inspection helpers
//! - [`domain`] - task record and processing options
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod files;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use domain::{JointMode, ProcessingOptions, Task, TaskStatus};
pub use engine::{
    ClusteringEngine, CommandEngine, EngineBridge, EngineError, LegacyTaskEntry, SharedLegacyTasks,
};
pub use state::{AppState, StateError, StateResponse};
