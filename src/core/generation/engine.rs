//! Generate-Validate-Repair Engine
//!
//! Drives one generation task through an explicit, bounded state machine:
//!
//! ```text
//! Drafting -> Extracting -> Validating -> Accepted
//!    ^                          |
//!    +------ Repairing <--------+ (any failure, budget left)
//!                |
//!                +--> Exhausted -> coerce + re-validate once -> Accepted | GenerationExhausted
//! ```
//!
//! At most `max_repair + 1` drafts are issued per task. Transport failures and timeouts
//! consume a repair unit like any other failure.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::instrument;

use super::error::GenerationExhausted;
use super::prompts;
use crate::core::extract::{extract_value, ExtractionError};
use crate::core::llm::{ChatRequest, LLMError, LLMProvider};
use crate::core::schema::{validate, Coercer, Schema, SchemaViolation, ValidationContext, ValidationMode};

// ============================================================================
// Types
// ============================================================================

/// Per-engine limits.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_repair: u32,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_repair: 2,
            timeout: Duration::from_secs(90),
            max_tokens: 4096,
        }
    }
}

/// One unit of work for the engine.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    /// Name used in logs and failures, e.g. `"reading"` or `"enhance_turn[2]"`
    pub name: String,
    pub schema: Schema,
    pub prompt: String,
    pub temperature: f32,
}

impl GenerationTask {
    pub fn new(name: impl Into<String>, schema: Schema, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            name: name.into(),
            schema,
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// A value that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub value: Value,
    /// Drafts issued, including the accepted one
    pub attempts: u32,
    /// Mode the value was validated under; re-validation in this mode yields nothing
    pub mode: ValidationMode,
}

/// Why one draft was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftFailure {
    Transport(String),
    Extraction(ExtractionError),
    Schema(Vec<SchemaViolation>),
}

impl std::fmt::Display for DraftFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftFailure::Transport(detail) => write!(f, "generator call failed: {detail}"),
            DraftFailure::Extraction(err) => write!(f, "extraction failed: {err}"),
            DraftFailure::Schema(violations) => write!(f, "{} schema violation(s)", violations.len()),
        }
    }
}

enum State {
    Drafting { feedback: Option<String> },
    Extracting { raw: String },
    Validating { value: Value },
    Repairing { failure: DraftFailure },
    Exhausted { failure: DraftFailure },
}

// ============================================================================
// Engine
// ============================================================================

/// Generate-validate-repair driver bound to one provider and metatext locale.
pub struct GenerationEngine {
    provider: Arc<dyn LLMProvider>,
    coercer: Coercer,
    settings: EngineSettings,
    system_instruction: String,
    locale: String,
}

impl std::fmt::Debug for GenerationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationEngine")
            .field("provider", &self.provider.id())
            .field("settings", &self.settings)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl GenerationEngine {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        coercer: Coercer,
        settings: EngineSettings,
        locale: impl Into<String>,
    ) -> Self {
        let locale = locale.into();
        Self {
            provider,
            coercer,
            settings,
            system_instruction: prompts::system_instruction(&locale),
            locale,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Validation parameters for `mode`: every translation map must carry the metatext
    /// locale.
    pub fn context(&self, mode: ValidationMode) -> ValidationContext {
        ValidationContext::strict(vec![self.locale.clone()]).with_mode(mode)
    }

    /// Re-validate an accepted value under the mode it was accepted in.
    pub fn revalidate(&self, schema: &Schema, accepted: &Accepted) -> Vec<SchemaViolation> {
        validate(schema, &accepted.value, &self.context(accepted.mode))
    }

    /// Run `task` to acceptance or exhaustion.
    #[instrument(skip(self, task), fields(task = %task.name, schema = %task.schema.kind))]
    pub async fn generate(&self, task: &GenerationTask) -> Result<Accepted, GenerationExhausted> {
        let mut repairs_left = self.settings.max_repair;
        let mut attempts: u32 = 0;
        let mut last_value: Option<Value> = None;
        let mut state = State::Drafting { feedback: None };

        loop {
            state = match state {
                State::Drafting { feedback } => {
                    attempts += 1;
                    match self.draft(task, feedback.as_deref()).await {
                        Ok(raw) => State::Extracting { raw },
                        Err(err) => State::Repairing {
                            failure: DraftFailure::Transport(err.to_string()),
                        },
                    }
                }

                State::Extracting { raw } => match extract_value(&raw) {
                    Ok(value) => State::Validating { value },
                    Err(err) => State::Repairing {
                        failure: DraftFailure::Extraction(err),
                    },
                },

                State::Validating { value } => {
                    let violations = validate(&task.schema, &value, &self.context(ValidationMode::Strict));
                    if violations.is_empty() {
                        tracing::info!(attempts, "draft accepted");
                        return Ok(Accepted {
                            value,
                            attempts,
                            mode: ValidationMode::Strict,
                        });
                    }
                    last_value = Some(value);
                    State::Repairing {
                        failure: DraftFailure::Schema(violations),
                    }
                }

                State::Repairing { failure } => {
                    if repairs_left == 0 {
                        State::Exhausted { failure }
                    } else {
                        repairs_left -= 1;
                        tracing::warn!(attempt = attempts, repairs_left, failure = %failure, "draft rejected, repairing");
                        State::Drafting {
                            feedback: Some(prompts::repair_feedback(&failure)),
                        }
                    }
                }

                State::Exhausted { failure } => {
                    return self.fallback(task, attempts, last_value, failure);
                }
            };
        }
    }

    /// Issue one generator call under the configured timeout.
    async fn draft(&self, task: &GenerationTask, feedback: Option<&str>) -> Result<String, LLMError> {
        let prompt = match feedback {
            Some(feedback) => format!("{}\n\n{}", task.prompt, feedback),
            None => task.prompt.clone(),
        };
        let request = ChatRequest::prompt(prompt)
            .with_system(self.system_instruction.clone())
            .with_temperature(task.temperature)
            .with_max_tokens(self.settings.max_tokens);

        match tokio::time::timeout(self.settings.timeout, self.provider.chat(request)).await {
            Ok(response) => response.map(|r| r.content),
            Err(_) => Err(LLMError::Timeout(self.settings.timeout.as_secs())),
        }
    }

    /// Coerce the last extracted value and re-validate it once in coerced mode.
    fn fallback(
        &self,
        task: &GenerationTask,
        attempts: u32,
        last_value: Option<Value>,
        failure: DraftFailure,
    ) -> Result<Accepted, GenerationExhausted> {
        let Some(mut value) = last_value else {
            tracing::error!(attempts, failure = %failure, "generation exhausted with nothing to coerce");
            return Err(GenerationExhausted {
                task: task.name.clone(),
                attempts,
                last_failure: failure.to_string(),
                violations: match failure {
                    DraftFailure::Schema(violations) => violations,
                    _ => Vec::new(),
                },
            });
        };

        let rewrites = self.coercer.coerce(&task.schema, &mut value, &self.locale);
        let violations = validate(&task.schema, &value, &self.context(ValidationMode::Coerced));

        if violations.is_empty() {
            tracing::warn!(attempts, rewrites, "accepted after structural coercion");
            return Ok(Accepted {
                value,
                attempts,
                mode: ValidationMode::Coerced,
            });
        }

        tracing::error!(
            attempts,
            rewrites,
            violations = violations.len(),
            "generation exhausted, coercion insufficient"
        );
        Err(GenerationExhausted {
            task: task.name.clone(),
            attempts,
            last_failure: failure.to_string(),
            violations,
        })
    }
}
