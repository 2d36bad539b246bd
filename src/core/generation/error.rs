use thiserror::Error;

use crate::core::schema::SchemaViolation;

/// A generation task ran out of repair budget and structural coercion did not help.
///
/// The only failure that escapes one generation; callers either fail the request or
/// record the affected card as absent.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("generation of '{task}' exhausted after {attempts} attempt(s): {last_failure}")]
pub struct GenerationExhausted {
    pub task: String,
    pub attempts: u32,
    /// Description of the final failure (transport, extraction or validation)
    pub last_failure: String,
    /// Violations left after coercion, or from the last validation when nothing could
    /// be coerced
    pub violations: Vec<SchemaViolation>,
}
