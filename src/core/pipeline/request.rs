//! Compile request and response payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CompileError, CompileFailure};
use crate::core::generation::EnhancementSummary;
use crate::core::lesson::{CardKind, LessonRoot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub descriptor_id: String,
    /// Locale of instructions, notes and translations
    pub metatext_locale: String,
    /// Provider selector; the configured default when absent
    #[serde(default)]
    pub model_selector: Option<String>,
    /// Generate and assemble without persisting
    #[serde(default)]
    pub dry_run: bool,
    /// Repair budget per generation; the configured default when absent
    #[serde(default)]
    pub max_repair: Option<u32>,
    /// Record exhausted cards as absent instead of failing the request
    #[serde(default)]
    pub partial: bool,
}

impl CompileRequest {
    pub fn new(descriptor_id: impl Into<String>, metatext_locale: impl Into<String>) -> Self {
        Self {
            descriptor_id: descriptor_id.into(),
            metatext_locale: metatext_locale.into(),
            model_selector: None,
            dry_run: false,
            max_repair: None,
            partial: false,
        }
    }

    pub fn with_model(mut self, selector: impl Into<String>) -> Self {
        self.model_selector = Some(selector.into());
        self
    }

    pub fn with_max_repair(mut self, max_repair: u32) -> Self {
        self.max_repair = Some(max_repair);
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub lesson_id: Uuid,
    pub version: u32,
    pub duration_ms: u64,
    pub absent_cards: Vec<CardKind>,
    pub enhancement: EnhancementSummary,
    /// Whether the lesson was written to the lesson store
    pub persisted: bool,
    pub lesson: LessonRoot,
}

/// What the binary prints: `{"status": "ok", ...}` or `{"status": "error", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CompileReport {
    Ok(Box<CompileResponse>),
    Error(CompileFailure),
}

impl From<Result<CompileResponse, CompileError>> for CompileReport {
    fn from(result: Result<CompileResponse, CompileError>) -> Self {
        match result {
            Ok(response) => CompileReport::Ok(Box::new(response)),
            Err(err) => CompileReport::Error(CompileFailure::from(&err)),
        }
    }
}

impl CompileReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, CompileReport::Ok(_))
    }
}
