//! Structural Coercion
//!
//! Deterministic rewrites of the malformed shapes generators are known to produce. Runs
//! once, after the repair budget is spent; the result is re-validated in
//! [`ValidationMode::Coerced`](super::ValidationMode::Coerced).

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{FieldType, Schema};
use crate::core::text::script::romanize;
use crate::core::text::Segmenter;

/// Rewrites a value toward its schema without inventing content.
///
/// Every fill-in is derived from text already present in the value: translations fall
/// back to a verbatim copy of the standard form, readings and transliterations come from
/// the segmenter.
#[derive(Clone)]
pub struct Coercer {
    segmenter: Arc<dyn Segmenter>,
}

impl std::fmt::Debug for Coercer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coercer").finish_non_exhaustive()
    }
}

impl Coercer {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Coerce `value` in place. Returns the number of rewrites applied.
    pub fn coerce(&self, schema: &Schema, value: &mut Value, locale: &str) -> usize {
        self.coerce_node(&schema.root, value, locale)
    }

    fn coerce_node(&self, ty: &FieldType, value: &mut Value, locale: &str) -> usize {
        match ty {
            FieldType::Text => match value {
                Value::Number(n) => {
                    *value = Value::String(n.to_string());
                    1
                }
                Value::Bool(b) => {
                    *value = Value::String(b.to_string());
                    1
                }
                _ => 0,
            },

            FieldType::Integer => {
                let parsed = value.as_str().and_then(|s| s.trim().parse::<i64>().ok());
                match parsed {
                    Some(n) => {
                        *value = Value::from(n);
                        1
                    }
                    None => 0,
                }
            }

            FieldType::Boolean => {
                let parsed = value.as_str().and_then(|s| match s.trim().to_lowercase().as_str() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                });
                match parsed {
                    Some(b) => {
                        *value = Value::Bool(b);
                        1
                    }
                    None => 0,
                }
            }

            FieldType::Enum(allowed) => {
                let Some(tag) = value.as_str() else { return 0 };
                let canonical = canonical_tag(tag);
                if canonical != tag && allowed.contains(&canonical.as_str()) {
                    *value = Value::String(canonical);
                    1
                } else {
                    0
                }
            }

            FieldType::List { item, .. } => {
                let mut rewrites = 0;
                if !value.is_array() && !value.is_null() {
                    let single = value.take();
                    *value = Value::Array(vec![single]);
                    rewrites += 1;
                }
                if let Some(items) = value.as_array_mut() {
                    for element in items {
                        rewrites += self.coerce_node(item, element, locale);
                    }
                }
                rewrites
            }

            FieldType::Object(fields) => {
                let Some(map) = value.as_object_mut() else { return 0 };
                let mut rewrites = 0;
                for field in fields {
                    if let Some(child) = map.get_mut(field.name) {
                        if !child.is_null() {
                            rewrites += self.coerce_node(&field.ty, child, locale);
                        }
                    }
                }
                rewrites
            }

            FieldType::Trilingual { .. } => self.coerce_trilingual(value, locale),
        }
    }

    fn coerce_trilingual(&self, value: &mut Value, locale: &str) -> usize {
        let mut rewrites = 0;

        if let Value::String(bare) = value {
            let bare = bare.clone();
            let mut map = Map::new();
            map.insert("standard_form".to_string(), Value::String(bare));
            *value = Value::Object(map);
            rewrites += 1;
        }

        let Some(map) = value.as_object_mut() else { return rewrites };
        let Some(standard_form) = map.get("standard_form").and_then(Value::as_str).map(String::from)
        else {
            return rewrites;
        };

        rewrites += normalize_translations(map, &standard_form, locale);

        let has_gloss = map
            .get("phonetic_gloss")
            .and_then(Value::as_str)
            .is_some_and(|g| !g.trim().is_empty());
        if !has_gloss {
            if let Some(reading) = self.segmenter.reading(&standard_form) {
                map.insert("phonetic_gloss".to_string(), Value::String(reading));
                rewrites += 1;
            }
        }

        let has_transliteration = map
            .get("transliteration")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.trim().is_empty());
        if !has_transliteration {
            let from_gloss = || {
                map.get("phonetic_gloss")
                    .and_then(Value::as_str)
                    .and_then(romanize)
                    .filter(|r| !r.trim().is_empty())
            };
            let transliteration = self.segmenter.transliterate(&standard_form).or_else(from_gloss);
            if let Some(t) = transliteration {
                map.insert("transliteration".to_string(), Value::String(t));
                rewrites += 1;
            }
        }

        rewrites
    }
}

/// Bring `translations` into the locale-map shape and make sure `locale` is present.
///
/// A missing translation is filled with the standard form verbatim, which only the
/// coerced validation mode tolerates.
fn normalize_translations(map: &mut Map<String, Value>, standard_form: &str, locale: &str) -> usize {
    let mut rewrites = 0;

    if let Some(singular) = map.remove("translation") {
        rewrites += 1;
        if !map.contains_key("translations") {
            map.insert("translations".to_string(), singular);
        }
    }

    match map.get("translations") {
        Some(Value::Object(_)) => {}
        Some(Value::String(s)) => {
            let mut locales = Map::new();
            locales.insert(locale.to_string(), Value::String(s.clone()));
            map.insert("translations".to_string(), Value::Object(locales));
            rewrites += 1;
        }
        _ => {
            map.insert("translations".to_string(), Value::Object(Map::new()));
            rewrites += 1;
        }
    }

    if let Some(Value::Object(locales)) = map.get_mut("translations") {
        let present = locales
            .get(locale)
            .and_then(Value::as_str)
            .is_some_and(|t| !t.trim().is_empty());
        if !present {
            locales.insert(locale.to_string(), Value::String(standard_form.to_string()));
            rewrites += 1;
        }
    }

    rewrites
}

/// Lowercase and join words with underscores: `"True-False"` → `"true_false"`.
fn canonical_tag(tag: &str) -> String {
    tag.trim()
        .to_lowercase()
        .split(|c: char| c == ' ' || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
