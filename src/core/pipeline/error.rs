//! Compile errors and their serializable form.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::generation::GenerationExhausted;
use crate::core::lesson::CardKind;
use crate::core::schema::SchemaViolation;
use crate::core::storage::StorageError;

/// Pipeline position a failure occurred at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Request,
    Plan,
    Card,
    Assembly,
    Persistence,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Request => "request",
            Stage::Plan => "plan",
            Stage::Card => "card",
            Stage::Assembly => "assembly",
            Stage::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

fn card_suffix(card: &Option<CardKind>) -> String {
    card.map(|c| format!(" for the {c} card")).unwrap_or_default()
}

#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("unknown lesson descriptor: {0}")]
    #[diagnostic(
        code(lessonforge::request::descriptor),
        help("store the descriptor before compiling it")
    )]
    UnknownDescriptor(String),

    #[error("unknown model selector '{selector}'")]
    #[diagnostic(code(lessonforge::request::model), help("configured selectors: {available}"))]
    UnknownModel { selector: String, available: String },

    #[error("invalid metatext locale '{0}'")]
    #[diagnostic(
        code(lessonforge::request::locale),
        help("metatext locales are Latin-script locale codes such as 'en' or 'es'")
    )]
    InvalidLocale(String),

    #[error("{stage} stage failed{}: {source}", card_suffix(.card))]
    #[diagnostic(
        code(lessonforge::generation::exhausted),
        help("raise max_repair, or compile with partial = true to keep the other cards")
    )]
    Generation {
        stage: Stage,
        card: Option<CardKind>,
        #[source]
        source: GenerationExhausted,
    },

    #[error("accepted {stage} output does not map onto the lesson model: {message}")]
    #[diagnostic(code(lessonforge::generation::model))]
    Model { stage: Stage, message: String },

    #[error("{stage} stage storage failure: {source}")]
    #[diagnostic(code(lessonforge::storage))]
    Storage {
        stage: Stage,
        #[source]
        source: StorageError,
    },
}

impl CompileError {
    pub fn generation(stage: Stage, card: Option<CardKind>, source: GenerationExhausted) -> Self {
        Self::Generation { stage, card, source }
    }

    pub fn storage(stage: Stage, source: StorageError) -> Self {
        Self::Storage { stage, source }
    }

    pub fn model(stage: Stage, err: serde_json::Error) -> Self {
        Self::Model {
            stage,
            message: err.to_string(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            CompileError::UnknownDescriptor(_)
            | CompileError::UnknownModel { .. }
            | CompileError::InvalidLocale(_) => Stage::Request,
            CompileError::Generation { stage, .. }
            | CompileError::Model { stage, .. }
            | CompileError::Storage { stage, .. } => *stage,
        }
    }
}

/// Failure payload returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileFailure {
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardKind>,
    pub message: String,
    #[serde(default)]
    pub violations: Vec<SchemaViolation>,
}

impl From<&CompileError> for CompileFailure {
    fn from(err: &CompileError) -> Self {
        let (card, violations) = match err {
            CompileError::Generation { card, source, .. } => (*card, source.violations.clone()),
            _ => (None, Vec::new()),
        };
        Self {
            stage: err.stage(),
            card,
            message: err.to_string(),
            violations,
        }
    }
}
