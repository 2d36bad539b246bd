//! Prompt Builders
//!
//! Every prompt ends with the JSON skeleton of the expected schema so the generator
//! sees field names, nesting and permitted type tags.

use serde_json::Value;

use super::engine::DraftFailure;
use crate::core::lesson::{CardKind, DialogueTurn, DomainPlan, LessonDescriptor, ReadingCard};
use crate::core::schema::{Schema, SchemaRegistry};

/// Violations listed in one repair message; the rest are summarized.
const MAX_LISTED_VIOLATIONS: usize = 25;

/// Shared system instruction for every generation call.
pub fn system_instruction(metatext_locale: &str) -> String {
    format!(
        "You write Japanese lessons for language learners.\n\
         Learner-facing Japanese is always a trilingual text object with four fields: \
         \"standard_form\" (natural Japanese in kanji and kana), \"phonetic_gloss\" (the \
         reading in hiragana only), \"transliteration\" (Hepburn romaji, no Japanese \
         characters) and \"translations\" (an object keyed by locale code).\n\
         Instructions, notes and translations are written in locale \"{metatext_locale}\" and \
         never contain Japanese characters.\n\
         Respond with exactly one JSON value and nothing else."
    )
}

fn shape(schema: &Schema, locale: &str) -> String {
    format!(
        "Return JSON with exactly this shape (placeholders in angle brackets):\n{:#}",
        schema.template(locale)
    )
}

fn descriptor_block(descriptor: &LessonDescriptor) -> String {
    let mut block = format!(
        "Level: {}\nTopic: {}\nCan-do: {}",
        descriptor.level, descriptor.topic, descriptor.can_do
    );
    if !descriptor.objectives.is_empty() {
        block.push_str(&format!("\nObjectives: {}", descriptor.objectives.join("; ")));
    }
    if !descriptor.vocabulary_hints.is_empty() {
        block.push_str(&format!("\nVocabulary to use: {}", descriptor.vocabulary_hints.join(", ")));
    }
    if !descriptor.grammar_hints.is_empty() {
        block.push_str(&format!("\nGrammar to use: {}", descriptor.grammar_hints.join(", ")));
    }
    block
}

pub fn plan_prompt(descriptor: &LessonDescriptor, schema: &Schema, locale: &str) -> String {
    format!(
        "Plan a lesson for this descriptor.\n\n{}\n\n\
         Name the communicative function the lesson targets, two or three realistic \
         scenarios, the grammar functions needed and observable evaluation criteria. \
         Write the plan in locale \"{locale}\".\n\n{}",
        descriptor_block(descriptor),
        shape(schema, locale)
    )
}

pub fn reading_prompt(
    descriptor: &LessonDescriptor,
    plan: &DomainPlan,
    schema: &Schema,
    locale: &str,
) -> String {
    format!(
        "Write the reading card: a short dialogue set in one of the plan's scenarios.\n\n\
         {}\n\n{}\n\n\
         Use between four and eight turns at the descriptor's level. Every turn's text is a \
         trilingual object.\n\n{}",
        descriptor_block(descriptor),
        plan.summary(),
        shape(schema, locale)
    )
}

fn reading_block(reading: &ReadingCard) -> String {
    let lines: Vec<String> = reading
        .passage
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker, turn.text.standard_form()))
        .collect();
    format!(
        "Reading \"{}\" ({}):\n{}",
        reading.title.standard_form(),
        reading.scenario,
        lines.join("\n")
    )
}

/// Prompt for a card that depends on the Reading card.
pub fn card_prompt(
    kind: CardKind,
    descriptor: &LessonDescriptor,
    plan: &DomainPlan,
    reading: &ReadingCard,
    schema: &Schema,
    locale: &str,
) -> String {
    let task = match kind {
        CardKind::Comprehension => "Write comprehension questions that check understanding of the reading.",
        CardKind::Production => "Write production exercises where the learner produces the target language from the reading.",
        CardKind::Interaction => "Write interaction activities where learners use the reading's language with a partner.",
        CardKind::Reading => "Write the reading card.",
    };
    let tags = SchemaRegistry::permitted_item_types(kind.schema_kind());
    let tag_line = if tags.is_empty() {
        String::new()
    } else {
        format!("\nThe \"type\" of every item must be one of: {}.", tags.join(", "))
    };

    format!(
        "{task}{tag_line}\n\n{}\n\n{}\n\n{}\n\n{}",
        descriptor_block(descriptor),
        plan.summary(),
        reading_block(reading),
        shape(schema, locale)
    )
}

fn turn_json(turn: &DialogueTurn) -> Value {
    serde_json::to_value(turn).unwrap_or(Value::Null)
}

const ENHANCE_INSTRUCTIONS: &str = "Add a hiragana \"phonetic_gloss\" to the text, one or more \
     learner \"notes\" explaining vocabulary or grammar, and useful \"key_phrases\" as \
     trilingual objects. Keep speaker and the existing text unchanged.";

pub fn enhance_batch_prompt(turns: &[DialogueTurn], schema: &Schema, locale: &str) -> String {
    let items: Vec<Value> = turns.iter().map(turn_json).collect();
    format!(
        "Enhance each of these {} dialogue turns. {ENHANCE_INSTRUCTIONS} Notes are written in \
         locale \"{locale}\". Return a JSON array with exactly {} items in the same order.\n\n\
         Turns:\n{:#}\n\n{}",
        turns.len(),
        turns.len(),
        Value::Array(items),
        shape(schema, locale)
    )
}

pub fn enhance_item_prompt(turn: &DialogueTurn, schema: &Schema, locale: &str) -> String {
    format!(
        "Enhance this dialogue turn. {ENHANCE_INSTRUCTIONS} Notes are written in locale \
         \"{locale}\".\n\nTurn:\n{:#}\n\n{}",
        turn_json(turn),
        shape(schema, locale)
    )
}

/// Corrective feedback appended to the next draft after a failure.
pub fn repair_feedback(failure: &DraftFailure) -> String {
    match failure {
        DraftFailure::Transport(detail) => format!(
            "The previous attempt failed before a response was received ({detail}). \
             Try again and respond with the JSON value only."
        ),
        DraftFailure::Extraction(err) => format!(
            "Your previous response could not be parsed: {err}. Respond with exactly one \
             complete JSON value, with no commentary and no truncation."
        ),
        DraftFailure::Schema(violations) => {
            let mut lines: Vec<String> = violations
                .iter()
                .take(MAX_LISTED_VIOLATIONS)
                .map(|v| format!("- {v}"))
                .collect();
            if violations.len() > MAX_LISTED_VIOLATIONS {
                lines.push(format!(
                    "- ... and {} more",
                    violations.len() - MAX_LISTED_VIOLATIONS
                ));
            }
            format!(
                "Your previous response broke {} rule(s):\n{}\nFix every problem and return \
                 the complete corrected JSON value.",
                violations.len(),
                lines.join("\n")
            )
        }
    }
}
