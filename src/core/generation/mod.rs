//! Generation Module
//!
//! Turns prompts into schema-valid values despite unreliable generator output.
//!
//! # Module Structure
//!
//! - `engine`: the bounded generate-validate-repair state machine
//! - `enhance`: batch-then-per-item enhancement of dialogue turns
//! - `prompts`: prompt and corrective-feedback builders
//! - `error`: `GenerationExhausted`

pub mod engine;
pub mod enhance;
pub mod error;
pub mod prompts;

pub use engine::{Accepted, DraftFailure, EngineSettings, GenerationEngine, GenerationTask};
pub use enhance::{EnhancementCoordinator, EnhancementSummary};
pub use error::GenerationExhausted;
