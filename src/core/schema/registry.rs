//! Schema Registry
//!
//! One schema per artifact kind. Card variants with sub-items declare a closed set of
//! type tags; a tag outside the set is always a violation.

use std::collections::HashMap;

use super::{Field, FieldType, Schema, SchemaKind};

pub const COMPREHENSION_ITEM_TYPES: &[&str] =
    &["multiple_choice", "true_false", "short_answer", "ordering"];

pub const PRODUCTION_EXERCISE_TYPES: &[&str] =
    &["fill_blank", "sentence_build", "translation", "free_response"];

pub const INTERACTION_ACTIVITY_TYPES: &[&str] =
    &["role_play", "information_gap", "dialogue_completion"];

/// Minimum number of turns in a reading passage.
const MIN_PASSAGE_TURNS: usize = 2;

/// Registry of all schemas, built once at startup.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaKind, Schema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let schemas = [
            Schema::new(SchemaKind::Plan, plan_root()),
            Schema::new(SchemaKind::Reading, reading_root()),
            Schema::new(SchemaKind::Comprehension, comprehension_root()),
            Schema::new(SchemaKind::Production, production_root()),
            Schema::new(SchemaKind::Interaction, interaction_root()),
            Schema::new(SchemaKind::EnhancedTurn, enhanced_turn_root()),
        ]
        .into_iter()
        .map(|s| (s.kind, s))
        .collect();

        Self { schemas }
    }

    /// Schema for `kind`.
    ///
    /// Batch kinds are sized per request; use [`SchemaRegistry::turn_batch`].
    pub fn get(&self, kind: SchemaKind) -> Option<&Schema> {
        self.schemas.get(&kind)
    }

    /// Schema for a batch of exactly `len` enhanced dialogue turns.
    pub fn turn_batch(&self, len: usize) -> Schema {
        Schema::new(
            SchemaKind::EnhancedTurnBatch,
            FieldType::exact_list(enhanced_turn_root(), len),
        )
    }

    /// Permitted sub-item type tags for a card kind (empty for untagged cards).
    pub fn permitted_item_types(kind: SchemaKind) -> &'static [&'static str] {
        match kind {
            SchemaKind::Comprehension => COMPREHENSION_ITEM_TYPES,
            SchemaKind::Production => PRODUCTION_EXERCISE_TYPES,
            SchemaKind::Interaction => INTERACTION_ACTIVITY_TYPES,
            _ => &[],
        }
    }
}

// ============================================================================
// Schema Definitions
// ============================================================================

fn plan_root() -> FieldType {
    FieldType::Object(vec![
        Field::required("target_function", FieldType::Text),
        Field::required("scenarios", FieldType::list(FieldType::Text, 1)),
        Field::required("grammar_functions", FieldType::list(FieldType::Text, 1)),
        Field::required("evaluation_criteria", FieldType::list(FieldType::Text, 1)),
    ])
}

fn dialogue_turn() -> FieldType {
    FieldType::Object(vec![
        Field::required("speaker", FieldType::Text),
        Field::required("text", FieldType::trilingual()),
        Field::optional("notes", FieldType::list(FieldType::Text, 0)),
        Field::optional("key_phrases", FieldType::list(FieldType::trilingual(), 0)),
    ])
}

fn reading_root() -> FieldType {
    FieldType::Object(vec![
        Field::required("title", FieldType::trilingual()),
        Field::required("scenario", FieldType::Text),
        Field::required("passage", FieldType::list(dialogue_turn(), MIN_PASSAGE_TURNS)),
    ])
}

fn enhanced_turn_root() -> FieldType {
    FieldType::Object(vec![
        Field::required("speaker", FieldType::Text),
        Field::required("text", FieldType::Trilingual { require_gloss: true }),
        Field::required("notes", FieldType::list(FieldType::Text, 1)),
        Field::optional("key_phrases", FieldType::list(FieldType::trilingual(), 0)),
    ])
}

fn comprehension_root() -> FieldType {
    FieldType::Object(vec![
        Field::required("instructions", FieldType::trilingual()),
        Field::required(
            "items",
            FieldType::list(
                FieldType::Object(vec![
                    Field::required("type", FieldType::Enum(COMPREHENSION_ITEM_TYPES)),
                    Field::required("question", FieldType::trilingual()),
                    Field::optional("options", FieldType::list(FieldType::trilingual(), 2)),
                    Field::required("answer", FieldType::Text),
                ]),
                1,
            ),
        ),
    ])
}

fn production_root() -> FieldType {
    FieldType::Object(vec![
        Field::required("instructions", FieldType::trilingual()),
        Field::required(
            "exercises",
            FieldType::list(
                FieldType::Object(vec![
                    Field::required("type", FieldType::Enum(PRODUCTION_EXERCISE_TYPES)),
                    Field::required("prompt", FieldType::trilingual()),
                    Field::required("model_answer", FieldType::trilingual()),
                    Field::optional("hint", FieldType::Text),
                ]),
                1,
            ),
        ),
    ])
}

fn interaction_root() -> FieldType {
    FieldType::Object(vec![
        Field::required("scenario", FieldType::trilingual()),
        Field::required(
            "activities",
            FieldType::list(
                FieldType::Object(vec![
                    Field::required("type", FieldType::Enum(INTERACTION_ACTIVITY_TYPES)),
                    Field::required("goal", FieldType::trilingual()),
                    Field::required("prompts", FieldType::list(FieldType::trilingual(), 1)),
                ]),
                1,
            ),
        ),
    ])
}
