//! Card Schema Registry & Validator
//!
//! Declarative schemas for every generated artifact, an exhaustive validator and the
//! structural coercion pass used once a repair budget runs out.
//!
//! # Module Structure
//!
//! - `registry`: per-kind schemas and closed item-type enumerations
//! - `validate`: total validation returning every [`SchemaViolation`]
//! - `coerce`: deterministic rewrites of known malformed shapes

pub mod coerce;
pub mod registry;
pub mod validate;

pub use coerce::Coercer;
pub use registry::{
    SchemaRegistry, COMPREHENSION_ITEM_TYPES, INTERACTION_ACTIVITY_TYPES, PRODUCTION_EXERCISE_TYPES,
};
pub use validate::validate;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ============================================================================
// Schema Definition
// ============================================================================

/// Shape expected at one position of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Non-empty string
    Text,
    /// Trilingual text object; `require_gloss` makes the phonetic gloss mandatory
    Trilingual { require_gloss: bool },
    Integer,
    Boolean,
    /// Closed set of permitted string tags
    Enum(&'static [&'static str]),
    List {
        item: Box<FieldType>,
        min: usize,
        max: Option<usize>,
    },
    Object(Vec<Field>),
}

impl FieldType {
    pub fn trilingual() -> Self {
        FieldType::Trilingual { require_gloss: false }
    }

    pub fn list(item: FieldType, min: usize) -> Self {
        FieldType::List {
            item: Box::new(item),
            min,
            max: None,
        }
    }

    pub fn exact_list(item: FieldType, len: usize) -> Self {
        FieldType::List {
            item: Box::new(item),
            min: len,
            max: Some(len),
        }
    }

    /// Example JSON skeleton used to show generators the expected shape.
    pub fn template(&self, locale: &str) -> Value {
        match self {
            FieldType::Text => json!("<text>"),
            FieldType::Trilingual { .. } => {
                let mut translations = Map::new();
                translations.insert(locale.to_string(), json!("<translation>"));
                json!({
                    "standard_form": "<Japanese text>",
                    "phonetic_gloss": "<hiragana reading>",
                    "transliteration": "<Hepburn romaji>",
                    "translations": translations
                })
            }
            FieldType::Integer => json!(0),
            FieldType::Boolean => json!(false),
            FieldType::Enum(tags) => json!(format!("<one of: {}>", tags.join(" | "))),
            FieldType::List { item, .. } => json!([item.template(locale)]),
            FieldType::Object(fields) => {
                let map: Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.name.to_string(), f.ty.template(locale)))
                    .collect();
                Value::Object(map)
            }
        }
    }
}

/// A named member of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: true }
    }

    pub fn optional(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: false }
    }
}

/// Every kind of artifact the engine can be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Plan,
    Reading,
    Comprehension,
    Production,
    Interaction,
    EnhancedTurn,
    EnhancedTurnBatch,
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchemaKind::Plan => "plan",
            SchemaKind::Reading => "reading",
            SchemaKind::Comprehension => "comprehension",
            SchemaKind::Production => "production",
            SchemaKind::Interaction => "interaction",
            SchemaKind::EnhancedTurn => "enhanced_turn",
            SchemaKind::EnhancedTurnBatch => "enhanced_turn_batch",
        };
        write!(f, "{}", name)
    }
}

/// A complete schema for one artifact kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub root: FieldType,
}

impl Schema {
    pub fn new(kind: SchemaKind, root: FieldType) -> Self {
        Self { kind, root }
    }

    pub fn template(&self, locale: &str) -> Value {
        self.root.template(locale)
    }
}

// ============================================================================
// Validation Types
// ============================================================================

/// One broken rule, qualified by the path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "$: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// How strictly translation fields are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Strict,
    /// Tolerates translations that verbatim echo the standard form, the placeholder
    /// written by structural coercion.
    Coerced,
}

/// Parameters shared by one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub mode: ValidationMode,
    /// Locales every translation map must contain
    pub required_locales: Vec<String>,
}

impl ValidationContext {
    pub fn strict(required_locales: Vec<String>) -> Self {
        Self {
            mode: ValidationMode::Strict,
            required_locales,
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }
}
