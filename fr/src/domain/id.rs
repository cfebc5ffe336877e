//! Task identifier generation
//!
//! Identifiers are opaque tokens that callers cannot guess. UUID v7 keeps
//! them time-ordered, so a freshly created batch sorts by creation.

use uuid::Uuid;

/// Generate a fresh task identifier
pub fn generate_task_id() -> String {
    Uuid::now_v7().to_string()
}
