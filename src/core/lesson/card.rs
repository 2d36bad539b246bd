//! Card Types
//!
//! Cards are only built from values the validator has accepted, so deserialization
//! failures here indicate a schema/type mismatch rather than bad generator output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::schema::SchemaKind;
use crate::core::text::{normalize, TrilingualText};

// ============================================================================
// Card Kinds
// ============================================================================

/// The four card slots of a lesson, in assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Reading,
    Comprehension,
    Production,
    Interaction,
}

impl CardKind {
    pub const ALL: [CardKind; 4] = [
        CardKind::Reading,
        CardKind::Comprehension,
        CardKind::Production,
        CardKind::Interaction,
    ];

    /// Cards generated from the plan and the Reading card.
    pub const DEPENDENT: [CardKind; 3] = [
        CardKind::Comprehension,
        CardKind::Production,
        CardKind::Interaction,
    ];

    pub fn schema_kind(self) -> SchemaKind {
        match self {
            CardKind::Reading => SchemaKind::Reading,
            CardKind::Comprehension => SchemaKind::Comprehension,
            CardKind::Production => SchemaKind::Production,
            CardKind::Interaction => SchemaKind::Interaction,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardKind::Reading => "reading",
            CardKind::Comprehension => "comprehension",
            CardKind::Production => "production",
            CardKind::Interaction => "interaction",
        }
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Whether a dialogue turn went through enhancement or kept its original content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementStatus {
    Enhanced,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub speaker: String,
    pub text: TrilingualText,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_phrases: Vec<TrilingualText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement: Option<EnhancementStatus>,
}

impl DialogueTurn {
    pub fn with_status(mut self, status: EnhancementStatus) -> Self {
        self.enhancement = Some(status);
        self
    }

    /// Same speaker and, after NFKC normalization, the same script form.
    pub fn is_same_line(&self, other: &DialogueTurn) -> bool {
        self.speaker.trim() == other.speaker.trim()
            && normalize(self.text.standard_form()).trim() == normalize(other.text.standard_form()).trim()
    }

    /// Apply the enhancement fields of `enhanced` and tag the turn enhanced.
    ///
    /// Speaker, script form, transliteration and translations stay as they were.
    pub fn enhanced_with(mut self, enhanced: DialogueTurn) -> Self {
        if let Some(gloss) = enhanced.text.phonetic_gloss() {
            self.text.set_phonetic_gloss(gloss);
        }
        self.notes = enhanced.notes;
        self.key_phrases = enhanced.key_phrases;
        self.with_status(EnhancementStatus::Enhanced)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingCard {
    pub title: TrilingualText,
    pub scenario: String,
    pub passage: Vec<DialogueTurn>,
}

// ============================================================================
// Comprehension
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComprehensionItemType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Ordering,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionItem {
    #[serde(rename = "type")]
    pub kind: ComprehensionItemType,
    pub question: TrilingualText,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<TrilingualText>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionCard {
    pub instructions: TrilingualText,
    pub items: Vec<ComprehensionItem>,
}

// ============================================================================
// Production
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionExerciseType {
    FillBlank,
    SentenceBuild,
    Translation,
    FreeResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionExercise {
    #[serde(rename = "type")]
    pub kind: ProductionExerciseType,
    pub prompt: TrilingualText,
    pub model_answer: TrilingualText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCard {
    pub instructions: TrilingualText,
    pub exercises: Vec<ProductionExercise>,
}

// ============================================================================
// Interaction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionActivityType {
    RolePlay,
    InformationGap,
    DialogueCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionActivity {
    #[serde(rename = "type")]
    pub kind: InteractionActivityType,
    pub goal: TrilingualText,
    pub prompts: Vec<TrilingualText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCard {
    pub scenario: TrilingualText,
    pub activities: Vec<InteractionActivity>,
}

// ============================================================================
// Card
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "card", rename_all = "snake_case")]
pub enum Card {
    Reading(ReadingCard),
    Comprehension(ComprehensionCard),
    Production(ProductionCard),
    Interaction(InteractionCard),
}

impl Card {
    /// Build the typed card for `kind` from an accepted value.
    pub fn from_value(kind: CardKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            CardKind::Reading => Card::Reading(serde_json::from_value(value)?),
            CardKind::Comprehension => Card::Comprehension(serde_json::from_value(value)?),
            CardKind::Production => Card::Production(serde_json::from_value(value)?),
            CardKind::Interaction => Card::Interaction(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> CardKind {
        match self {
            Card::Reading(_) => CardKind::Reading,
            Card::Comprehension(_) => CardKind::Comprehension,
            Card::Production(_) => CardKind::Production,
            Card::Interaction(_) => CardKind::Interaction,
        }
    }

    pub fn as_reading(&self) -> Option<&ReadingCard> {
        match self {
            Card::Reading(reading) => Some(reading),
            _ => None,
        }
    }

    /// Every trilingual value in the card, in document order.
    pub fn texts(&self) -> Vec<&TrilingualText> {
        let mut out = Vec::new();
        match self {
            Card::Reading(c) => {
                out.push(&c.title);
                for turn in &c.passage {
                    out.push(&turn.text);
                    out.extend(turn.key_phrases.iter());
                }
            }
            Card::Comprehension(c) => {
                out.push(&c.instructions);
                for item in &c.items {
                    out.push(&item.question);
                    out.extend(item.options.iter());
                }
            }
            Card::Production(c) => {
                out.push(&c.instructions);
                for exercise in &c.exercises {
                    out.push(&exercise.prompt);
                    out.push(&exercise.model_answer);
                }
            }
            Card::Interaction(c) => {
                out.push(&c.scenario);
                for activity in &c.activities {
                    out.push(&activity.goal);
                    out.extend(activity.prompts.iter());
                }
            }
        }
        out
    }
}
