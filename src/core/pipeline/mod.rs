//! Stage Orchestrator
//!
//! Compiles a lesson descriptor into an assembled, validated lesson document.
//!
//! # Module Structure
//!
//! - `compiler`: the `LessonCompiler` and its stage sequence
//! - `request`: compile request, response and printed report
//! - `error`: `CompileError` and its serializable `CompileFailure`

pub mod compiler;
pub mod error;
pub mod request;

pub use compiler::{LessonCompiler, UPSTREAM_UNAVAILABLE};
pub use error::{CompileError, CompileFailure, Stage};
pub use request::{CompileReport, CompileRequest, CompileResponse};
