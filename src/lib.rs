//! Lessonforge - structured lesson compiler
//!
//! Turns terse pedagogical descriptors into schema-valid, trilingual lesson documents
//! through a bounded generate-validate-repair pipeline, links them to a vocabulary and
//! grammar graph, and tracks learner mastery.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
