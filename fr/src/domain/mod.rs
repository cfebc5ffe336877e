//! Domain types for queue and task tracking

mod id;
mod task;

pub use id::generate_task_id;
pub use task::{JointMode, ProcessingOptions, Task, TaskStatus, now_ms};
