//! Per-Item Enhancement Coordinator
//!
//! Enhances the dialogue turns of a reading card. One batched call is tried first; if
//! it is exhausted, each turn is enhanced on its own, and a turn whose own call is
//! exhausted keeps its original content tagged [`EnhancementStatus::Fallback`]. Output
//! length and order always equal the input.
//!
//! Enhanced answers only contribute the gloss, notes and key phrases. An answer whose
//! speaker or script form differs from the turn it answers is rejected: the whole batch
//! falls back to per-item enhancement, a single item falls back to the original.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::engine::{GenerationEngine, GenerationTask};
use super::prompts;
use crate::core::lesson::{DialogueTurn, EnhancementStatus};
use crate::core::schema::{SchemaKind, SchemaRegistry};

/// Counts reported after one enhancement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementSummary {
    pub total: usize,
    pub enhanced: usize,
    pub fallback: usize,
}

impl EnhancementSummary {
    fn of(turns: &[DialogueTurn]) -> Self {
        let enhanced = turns
            .iter()
            .filter(|t| t.enhancement == Some(EnhancementStatus::Enhanced))
            .count();
        Self {
            total: turns.len(),
            enhanced,
            fallback: turns.len() - enhanced,
        }
    }
}

pub struct EnhancementCoordinator<'a> {
    engine: &'a GenerationEngine,
    schemas: &'a SchemaRegistry,
    temperature: f32,
}

impl<'a> EnhancementCoordinator<'a> {
    pub fn new(engine: &'a GenerationEngine, schemas: &'a SchemaRegistry, temperature: f32) -> Self {
        Self {
            engine,
            schemas,
            temperature,
        }
    }

    /// Enhance `turns`, never dropping or reordering one.
    #[instrument(skip_all, fields(turns = turns.len()))]
    pub async fn enhance(&self, turns: Vec<DialogueTurn>) -> (Vec<DialogueTurn>, EnhancementSummary) {
        if turns.is_empty() {
            return (turns, EnhancementSummary::default());
        }

        let output = match self.enhance_batch(&turns).await {
            Some(enhanced) => enhanced,
            None => {
                let mut output = Vec::with_capacity(turns.len());
                for (index, turn) in turns.into_iter().enumerate() {
                    output.push(self.enhance_one(index, turn).await);
                }
                output
            }
        };

        let summary = EnhancementSummary::of(&output);
        tracing::info!(
            total = summary.total,
            enhanced = summary.enhanced,
            fallback = summary.fallback,
            "enhancement finished"
        );
        (output, summary)
    }

    async fn enhance_batch(&self, turns: &[DialogueTurn]) -> Option<Vec<DialogueTurn>> {
        let schema = self.schemas.turn_batch(turns.len());
        let prompt = prompts::enhance_batch_prompt(turns, &schema, self.engine.locale());
        let task = GenerationTask::new("enhance_batch", schema, prompt, self.temperature);

        let accepted = match self.engine.generate(&task).await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(error = %err, "batch enhancement exhausted, enhancing per item");
                return None;
            }
        };

        let Value::Array(items) = accepted.value else {
            return None;
        };
        if items.len() != turns.len() {
            return None;
        }

        let mut output = Vec::with_capacity(turns.len());
        for (index, (original, item)) in turns.iter().zip(items).enumerate() {
            let enhanced = match serde_json::from_value::<DialogueTurn>(item) {
                Ok(enhanced) => enhanced,
                Err(err) => {
                    tracing::warn!(index, error = %err, "batch item did not map onto a dialogue turn");
                    return None;
                }
            };
            if !original.is_same_line(&enhanced) {
                tracing::warn!(index, "batch item does not match its input turn, enhancing per item");
                return None;
            }
            output.push(original.clone().enhanced_with(enhanced));
        }
        Some(output)
    }

    async fn enhance_one(&self, index: usize, turn: DialogueTurn) -> DialogueTurn {
        let Some(schema) = self.schemas.get(SchemaKind::EnhancedTurn) else {
            return turn.with_status(EnhancementStatus::Fallback);
        };
        let prompt = prompts::enhance_item_prompt(&turn, schema, self.engine.locale());
        let task = GenerationTask::new(
            format!("enhance_turn[{index}]"),
            schema.clone(),
            prompt,
            self.temperature,
        );

        let accepted = match self.engine.generate(&task).await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(index, error = %err, "turn enhancement exhausted, keeping original");
                return turn.with_status(EnhancementStatus::Fallback);
            }
        };

        match serde_json::from_value::<DialogueTurn>(accepted.value) {
            Ok(enhanced) if turn.is_same_line(&enhanced) => turn.enhanced_with(enhanced),
            Ok(_) => {
                tracing::warn!(index, "enhanced turn does not match its input, keeping original");
                turn.with_status(EnhancementStatus::Fallback)
            }
            Err(err) => {
                tracing::warn!(index, error = %err, "enhanced turn did not map onto a dialogue turn");
                turn.with_status(EnhancementStatus::Fallback)
            }
        }
    }
}
