//! Total schema validation.
//!
//! Every rule is checked and every violation collected, so a single repair prompt can
//! address all of them at once.

use serde_json::{Map, Value};

use super::{FieldType, Schema, SchemaViolation, ValidationContext, ValidationMode};
use crate::core::text::script::{contains_native, ScriptClass};

/// Validate `value` against `schema`, returning all violations (empty when valid).
pub fn validate(schema: &Schema, value: &Value, ctx: &ValidationContext) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    check(&schema.root, value, "", ctx, &mut violations);
    violations
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check(ty: &FieldType, value: &Value, path: &str, ctx: &ValidationContext, out: &mut Vec<SchemaViolation>) {
    match ty {
        FieldType::Text => match value.as_str() {
            Some(s) if !s.trim().is_empty() => {}
            Some(_) => out.push(SchemaViolation::new(path, "text must not be empty")),
            None => out.push(SchemaViolation::new(
                path,
                format!("expected text, found {}", type_name(value)),
            )),
        },

        FieldType::Integer => {
            if !(value.is_i64() || value.is_u64()) {
                out.push(SchemaViolation::new(
                    path,
                    format!("expected integer, found {}", type_name(value)),
                ));
            }
        }

        FieldType::Boolean => {
            if !value.is_boolean() {
                out.push(SchemaViolation::new(
                    path,
                    format!("expected boolean, found {}", type_name(value)),
                ));
            }
        }

        FieldType::Enum(allowed) => match value.as_str() {
            Some(tag) if allowed.contains(&tag) => {}
            Some(tag) => out.push(SchemaViolation::new(
                path,
                format!("'{}' is not a permitted type; expected one of: {}", tag, allowed.join(", ")),
            )),
            None => out.push(SchemaViolation::new(
                path,
                format!("expected type tag string, found {}", type_name(value)),
            )),
        },

        FieldType::List { item, min, max } => {
            let Some(items) = value.as_array() else {
                out.push(SchemaViolation::new(
                    path,
                    format!("expected array, found {}", type_name(value)),
                ));
                return;
            };
            if items.len() < *min {
                out.push(SchemaViolation::new(
                    path,
                    format!("expected at least {} item(s), found {}", min, items.len()),
                ));
            }
            if let Some(max) = max {
                if items.len() > *max {
                    out.push(SchemaViolation::new(
                        path,
                        format!("expected at most {} item(s), found {}", max, items.len()),
                    ));
                }
            }
            for (i, element) in items.iter().enumerate() {
                check(item, element, &index_path(path, i), ctx, out);
            }
        }

        FieldType::Object(fields) => {
            let Some(map) = value.as_object() else {
                out.push(SchemaViolation::new(
                    path,
                    format!("expected object, found {}", type_name(value)),
                ));
                return;
            };
            for field in fields {
                let field_path = child_path(path, field.name);
                match map.get(field.name) {
                    None | Some(Value::Null) => {
                        if field.required {
                            out.push(SchemaViolation::new(field_path, "missing required field"));
                        }
                    }
                    Some(v) => check(&field.ty, v, &field_path, ctx, out),
                }
            }
        }

        FieldType::Trilingual { require_gloss } => {
            check_trilingual(value, *require_gloss, path, ctx, out);
        }
    }
}

fn check_trilingual(
    value: &Value,
    require_gloss: bool,
    path: &str,
    ctx: &ValidationContext,
    out: &mut Vec<SchemaViolation>,
) {
    let Some(map) = value.as_object() else {
        out.push(SchemaViolation::new(
            path,
            format!("expected trilingual text object, found {}", type_name(value)),
        ));
        return;
    };

    let standard_form = match map.get("standard_form") {
        Some(Value::String(s)) => {
            if !contains_native(s) {
                out.push(SchemaViolation::new(
                    child_path(path, "standard_form"),
                    "must contain at least one Japanese (kana or kanji) character",
                ));
            }
            Some(s.as_str())
        }
        Some(other) => {
            out.push(SchemaViolation::new(
                child_path(path, "standard_form"),
                format!("expected text, found {}", type_name(other)),
            ));
            None
        }
        None => {
            out.push(SchemaViolation::new(child_path(path, "standard_form"), "missing required field"));
            None
        }
    };

    check_gloss(map, require_gloss, path, out);

    if standard_form.is_some_and(|s| !s.is_empty()) {
        let translit_path = child_path(path, "transliteration");
        match map.get("transliteration") {
            Some(Value::String(t)) if t.trim().is_empty() => {
                out.push(SchemaViolation::new(translit_path, "must not be empty"));
            }
            Some(Value::String(t)) if contains_native(t) => {
                out.push(SchemaViolation::new(
                    translit_path,
                    "must be romanized; contains Japanese characters",
                ));
            }
            Some(Value::String(_)) => {}
            Some(other) => out.push(SchemaViolation::new(
                translit_path,
                format!("expected text, found {}", type_name(other)),
            )),
            None => out.push(SchemaViolation::new(translit_path, "missing required field")),
        }
    }

    check_translations(map, standard_form, path, ctx, out);
}

fn check_gloss(map: &Map<String, Value>, require_gloss: bool, path: &str, out: &mut Vec<SchemaViolation>) {
    let gloss_path = child_path(path, "phonetic_gloss");
    match map.get("phonetic_gloss") {
        None | Some(Value::Null) => {
            if require_gloss {
                out.push(SchemaViolation::new(gloss_path, "missing required field"));
            }
        }
        Some(Value::String(g)) => {
            if require_gloss && g.trim().is_empty() {
                out.push(SchemaViolation::new(gloss_path.clone(), "must not be empty"));
            }
            if g.chars().any(|c| ScriptClass::of(c) == ScriptClass::Kanji) {
                out.push(SchemaViolation::new(gloss_path, "must be written in kana, not kanji"));
            }
        }
        Some(other) => out.push(SchemaViolation::new(
            gloss_path,
            format!("expected text, found {}", type_name(other)),
        )),
    }
}

fn check_translations(
    map: &Map<String, Value>,
    standard_form: Option<&str>,
    path: &str,
    ctx: &ValidationContext,
    out: &mut Vec<SchemaViolation>,
) {
    let translations_path = child_path(path, "translations");
    let translations = match map.get("translations") {
        Some(Value::Object(t)) => t,
        Some(other) => {
            out.push(SchemaViolation::new(
                translations_path,
                format!("expected object keyed by locale, found {}", type_name(other)),
            ));
            return;
        }
        None => {
            out.push(SchemaViolation::new(translations_path, "missing required field"));
            return;
        }
    };

    if translations.is_empty() {
        out.push(SchemaViolation::new(&translations_path, "must contain at least one translation"));
    }

    for (locale, text) in translations {
        let locale_path = child_path(&translations_path, locale);
        match text.as_str() {
            Some(t) if t.trim().is_empty() => {
                out.push(SchemaViolation::new(locale_path, "must not be empty"));
            }
            Some(t) if contains_native(t) => {
                let echo = ctx.mode == ValidationMode::Coerced && standard_form == Some(t);
                if !echo {
                    out.push(SchemaViolation::new(
                        locale_path,
                        "translation must not contain Japanese characters",
                    ));
                }
            }
            Some(_) => {}
            None => out.push(SchemaViolation::new(
                locale_path,
                format!("expected text, found {}", type_name(text)),
            )),
        }
    }

    for locale in &ctx.required_locales {
        if !translations.contains_key(locale) {
            out.push(SchemaViolation::new(
                child_path(&translations_path, locale),
                "missing required translation",
            ));
        }
    }
}
