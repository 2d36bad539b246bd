//! Storage Module
//!
//! Two stores back the compiler:
//!
//! - `graph` - vocabulary/grammar/skill graph and mastery state (SurrealDB, embedded)
//! - `lessons` - descriptors, compiled lessons and evidence (SQLite via sqlx)
//! - `error` - error types shared by both

pub mod error;
pub mod graph;
pub mod lessons;

pub use error::{StorageError, StorageResult};
pub use graph::{GraphStore, SurrealGraphStore};
pub use lessons::{LessonRepository, SqliteLessonRepository};
