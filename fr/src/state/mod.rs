//! Canonical in-memory state: pending queue, active tasks, task history
//!
//! All shared mutable state lives behind the [`AppState`] actor.

mod manager;
mod messages;

pub use manager::AppState;
pub use messages::{StateCommand, StateError, StateResponse};
