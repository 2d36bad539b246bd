//! Core lesson compiler components.

pub mod extract;
pub mod generation;
pub mod lesson;
pub mod llm;
pub mod logging;
pub mod mastery;
pub mod pipeline;
pub mod resolution;
pub mod schema;
pub mod storage;
pub mod text;
