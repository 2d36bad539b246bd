//! Trilingual Text Value
//!
//! The atomic multilingual text type carried by every learner-facing field of a lesson:
//! native script, phonetic gloss (kana reading), transliteration (romaji) and
//! translations keyed by locale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::script::contains_native;

/// A validated multilingual text value.
///
/// Values are only produced by deserializing schema-validated JSON. For every instance
/// reachable from a card accepted in strict mode:
///
/// - `standard_form` contains at least one native-script character
/// - translations contain no native-script characters
/// - `transliteration` is non-empty whenever `standard_form` is
///
/// Cards accepted in coerced mode keep the first and last rule only; a translation may
/// echo the standard form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrilingualText {
    standard_form: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    phonetic_gloss: String,
    transliteration: String,
    translations: BTreeMap<String, String>,
}

impl TrilingualText {
    pub fn standard_form(&self) -> &str {
        &self.standard_form
    }

    pub fn phonetic_gloss(&self) -> Option<&str> {
        Some(self.phonetic_gloss.as_str()).filter(|g| !g.is_empty())
    }

    pub fn transliteration(&self) -> &str {
        &self.transliteration
    }

    pub fn set_phonetic_gloss(&mut self, gloss: impl Into<String>) {
        self.phonetic_gloss = gloss.into();
    }

    pub fn translations(&self) -> &BTreeMap<String, String> {
        &self.translations
    }

    /// Translation for `locale`, if present.
    pub fn translation(&self, locale: &str) -> Option<&str> {
        self.translations.get(locale).map(String::as_str)
    }

    /// Check the value-level invariants, returning a message per broken rule.
    ///
    /// Schema validation performs the same checks with field paths attached; this is
    /// used on values that were constructed outside the validator.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !contains_native(&self.standard_form) {
            problems.push("standard_form contains no native-script character".to_string());
        }
        if !self.standard_form.is_empty() && self.transliteration.trim().is_empty() {
            problems.push("transliteration is empty".to_string());
        }
        for (locale, text) in &self.translations {
            if contains_native(text) {
                problems.push(format!("translation '{locale}' contains native-script characters"));
            }
        }
        problems
    }
}

impl std::fmt::Display for TrilingualText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.standard_form)
    }
}
