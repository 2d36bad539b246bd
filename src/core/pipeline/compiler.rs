//! Lesson Compiler
//!
//! Stage order for one request:
//!
//! ```text
//! descriptor -> plan -> reading -> enhance(reading.passage)
//!            -> join(comprehension, production, interaction)
//!            -> resolve entities -> persist (unless dry run)
//! ```
//!
//! Every collaborator is injected at construction; nothing is looked up globally.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use super::error::{CompileError, Stage};
use super::request::{CompileRequest, CompileResponse};
use crate::config::{AppConfig, GenerationConfig};
use crate::core::generation::{
    prompts, EngineSettings, EnhancementCoordinator, EnhancementSummary, GenerationEngine,
    GenerationTask,
};
use crate::core::lesson::{Card, CardKind, CardSlot, DomainPlan, LessonDescriptor, LessonRoot, ReadingCard};
use crate::core::llm::{LLMProvider, ProviderRegistry};
use crate::core::resolution::{standard_forms, EntityResolver};
use crate::core::schema::{Coercer, Schema, SchemaKind, SchemaRegistry};
use crate::core::storage::LessonRepository;
use crate::core::text::{contains_native, Segmenter};

/// Reason recorded on dependent cards when the reading card is absent.
pub const UPSTREAM_UNAVAILABLE: &str = "upstream reading card unavailable";

pub struct LessonCompiler {
    providers: ProviderRegistry,
    repository: Arc<dyn LessonRepository>,
    resolver: Arc<EntityResolver>,
    schemas: Arc<SchemaRegistry>,
    coercer: Coercer,
    generation: GenerationConfig,
    default_model: String,
}

impl std::fmt::Debug for LessonCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonCompiler")
            .field("providers", &self.providers)
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

impl LessonCompiler {
    pub fn new(
        providers: ProviderRegistry,
        repository: Arc<dyn LessonRepository>,
        resolver: Arc<EntityResolver>,
        segmenter: Arc<dyn Segmenter>,
        config: &AppConfig,
    ) -> Self {
        Self {
            providers,
            repository,
            resolver,
            schemas: Arc::new(SchemaRegistry::new()),
            coercer: Coercer::new(segmenter),
            generation: config.generation.clone(),
            default_model: config.default_model.clone(),
        }
    }

    /// Compile one lesson.
    #[instrument(skip(self, request), fields(descriptor = %request.descriptor_id, locale = %request.metatext_locale))]
    pub async fn compile(&self, request: &CompileRequest) -> Result<CompileResponse, CompileError> {
        let started = Instant::now();

        let (selector, provider) = self.check_request(request)?;
        let descriptor = self
            .repository
            .load_descriptor(&request.descriptor_id)
            .await
            .map_err(|e| CompileError::storage(Stage::Request, e))?
            .ok_or_else(|| CompileError::UnknownDescriptor(request.descriptor_id.clone()))?;
        let version = self
            .repository
            .latest_version(&descriptor.id)
            .await
            .map_err(|e| CompileError::storage(Stage::Request, e))?
            .map_or(1, |latest| latest + 1);

        let engine = GenerationEngine::new(
            provider,
            self.coercer.clone(),
            EngineSettings {
                max_repair: request.max_repair.unwrap_or(self.generation.max_repair),
                timeout: Duration::from_secs(self.generation.timeout_secs),
                max_tokens: self.generation.max_tokens,
            },
            request.metatext_locale.clone(),
        );

        let plan = Arc::new(self.plan(&engine, &descriptor).await?);
        let (reading, enhancement) = self.reading(&engine, &descriptor, &plan, request.partial).await?;

        let (comprehension, production, interaction) =
            match reading.card().and_then(Card::as_reading) {
                Some(card) => {
                    let card = Arc::new(card.clone());
                    self.dependent_cards(&engine, &descriptor, &plan, &card, request.partial)
                        .await?
                }
                None => {
                    tracing::warn!("reading card absent, skipping dependent cards");
                    (
                        CardSlot::absent(UPSTREAM_UNAVAILABLE, Vec::new()),
                        CardSlot::absent(UPSTREAM_UNAVAILABLE, Vec::new()),
                        CardSlot::absent(UPSTREAM_UNAVAILABLE, Vec::new()),
                    )
                }
            };

        let mut lesson = LessonRoot {
            lesson_id: Uuid::new_v4(),
            descriptor_id: descriptor.id.clone(),
            version,
            level: descriptor.level.clone(),
            objectives: descriptor.objectives.clone(),
            metatext_locale: request.metatext_locale.clone(),
            model: selector,
            plan: DomainPlan::clone(&plan),
            reading,
            comprehension,
            production,
            interaction,
            entities: Default::default(),
            created_at: Utc::now(),
        };

        let entities = {
            let texts = standard_forms(lesson.cards());
            self.resolver
                .resolve(&texts)
                .await
                .map_err(|e| CompileError::storage(Stage::Assembly, e))?
        };
        lesson.entities = entities;

        if request.dry_run {
            tracing::info!(version, "dry run, lesson not persisted");
        } else {
            self.repository
                .save_lesson(&lesson)
                .await
                .map_err(|e| CompileError::storage(Stage::Persistence, e))?;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let absent_cards = lesson.absent_cards();
        tracing::info!(
            lesson_id = %lesson.lesson_id,
            version,
            duration_ms,
            absent = absent_cards.len(),
            "lesson compiled"
        );

        Ok(CompileResponse {
            lesson_id: lesson.lesson_id,
            version,
            duration_ms,
            absent_cards,
            enhancement,
            persisted: !request.dry_run,
            lesson,
        })
    }

    /// Reject requests that cannot succeed before any generator call.
    fn check_request(&self, request: &CompileRequest) -> Result<(String, Arc<dyn LLMProvider>), CompileError> {
        let locale = request.metatext_locale.trim();
        if locale.is_empty() || contains_native(locale) {
            return Err(CompileError::InvalidLocale(request.metatext_locale.clone()));
        }

        let selector = request
            .model_selector
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let provider = self
            .providers
            .get(&selector)
            .ok_or_else(|| CompileError::UnknownModel {
                selector: selector.clone(),
                available: self.providers.selectors().collect::<Vec<_>>().join(", "),
            })?;
        Ok((selector, provider))
    }

    fn schema(&self, kind: SchemaKind, stage: Stage) -> Result<Schema, CompileError> {
        self.schemas.get(kind).cloned().ok_or_else(|| CompileError::Model {
            stage,
            message: format!("no schema registered for {kind}"),
        })
    }

    async fn plan(&self, engine: &GenerationEngine, descriptor: &LessonDescriptor) -> Result<DomainPlan, CompileError> {
        let schema = self.schema(SchemaKind::Plan, Stage::Plan)?;
        let prompt = prompts::plan_prompt(descriptor, &schema, engine.locale());
        let task = GenerationTask::new("plan", schema, prompt, self.generation.plan_temperature);

        let accepted = engine
            .generate(&task)
            .await
            .map_err(|e| CompileError::generation(Stage::Plan, None, e))?;
        serde_json::from_value(accepted.value).map_err(|e| CompileError::model(Stage::Plan, e))
    }

    async fn reading(
        &self,
        engine: &GenerationEngine,
        descriptor: &LessonDescriptor,
        plan: &DomainPlan,
        partial: bool,
    ) -> Result<(CardSlot, EnhancementSummary), CompileError> {
        let schema = self.schema(SchemaKind::Reading, Stage::Card)?;
        let prompt = prompts::reading_prompt(descriptor, plan, &schema, engine.locale());
        let task = GenerationTask::new(
            CardKind::Reading.as_str(),
            schema,
            prompt,
            self.generation.card_temperature,
        );

        let generated = engine
            .generate(&task)
            .await
            .map_err(|e| CompileError::generation(Stage::Card, Some(CardKind::Reading), e))
            .and_then(|accepted| {
                serde_json::from_value::<ReadingCard>(accepted.value)
                    .map_err(|e| CompileError::model(Stage::Card, e))
            });

        let mut reading = match generated {
            Ok(card) => card,
            Err(err) if partial => return Ok((absent_slot(err), EnhancementSummary::default())),
            Err(err) => return Err(err),
        };

        let coordinator =
            EnhancementCoordinator::new(engine, &self.schemas, self.generation.enhance_temperature);
        let passage = std::mem::take(&mut reading.passage);
        let (passage, summary) = coordinator.enhance(passage).await;
        reading.passage = passage;

        Ok((CardSlot::present(Card::Reading(reading)), summary))
    }

    async fn dependent_cards(
        &self,
        engine: &GenerationEngine,
        descriptor: &LessonDescriptor,
        plan: &Arc<DomainPlan>,
        reading: &Arc<ReadingCard>,
        partial: bool,
    ) -> Result<(CardSlot, CardSlot, CardSlot), CompileError> {
        let (comprehension, production, interaction) = tokio::join!(
            self.card(engine, CardKind::Comprehension, descriptor, Arc::clone(plan), Arc::clone(reading)),
            self.card(engine, CardKind::Production, descriptor, Arc::clone(plan), Arc::clone(reading)),
            self.card(engine, CardKind::Interaction, descriptor, Arc::clone(plan), Arc::clone(reading)),
        );

        let slot = |result: Result<Card, CompileError>| -> Result<CardSlot, CompileError> {
            match result {
                Ok(card) => Ok(CardSlot::present(card)),
                Err(err) if partial => Ok(absent_slot(err)),
                Err(err) => Err(err),
            }
        };
        Ok((slot(comprehension)?, slot(production)?, slot(interaction)?))
    }

    async fn card(
        &self,
        engine: &GenerationEngine,
        kind: CardKind,
        descriptor: &LessonDescriptor,
        plan: Arc<DomainPlan>,
        reading: Arc<ReadingCard>,
    ) -> Result<Card, CompileError> {
        let schema = self.schema(kind.schema_kind(), Stage::Card)?;
        let prompt = prompts::card_prompt(kind, descriptor, &plan, &reading, &schema, engine.locale());
        let task = GenerationTask::new(kind.as_str(), schema, prompt, self.generation.card_temperature);

        let accepted = engine
            .generate(&task)
            .await
            .map_err(|e| CompileError::generation(Stage::Card, Some(kind), e))?;
        Card::from_value(kind, accepted.value).map_err(|e| CompileError::model(Stage::Card, e))
    }
}

fn absent_slot(err: CompileError) -> CardSlot {
    tracing::warn!(error = %err, "card exhausted, recording absent");
    match err {
        CompileError::Generation { source, .. } => {
            let reason = source.to_string();
            CardSlot::absent(reason, source.violations)
        }
        other => CardSlot::absent(other.to_string(), Vec::new()),
    }
}
