//! Test Fixtures
//!
//! A small, fully valid lesson (metatext locale `en`) and a responder that answers each
//! pipeline prompt with the matching artifact.

use serde_json::{json, Value};

use crate::core::lesson::LessonDescriptor;

pub const DESCRIPTOR_ID: &str = "shopping-a1";

pub fn descriptor() -> LessonDescriptor {
    LessonDescriptor {
        id: DESCRIPTOR_ID.to_string(),
        level: "A1".to_string(),
        topic: "shopping".to_string(),
        can_do: "Can ask how much something costs".to_string(),
        objectives: vec!["ask prices".to_string()],
        vocabulary_hints: vec!["いくら".to_string()],
        grammar_hints: vec!["ください".to_string()],
    }
}

/// Trilingual text with an English translation.
pub fn tt(standard_form: &str, transliteration: &str, en: &str) -> Value {
    json!({
        "standard_form": standard_form,
        "transliteration": transliteration,
        "translations": {"en": en}
    })
}

/// Trilingual text with a kana gloss equal to the standard form.
pub fn tt_glossed(standard_form: &str, transliteration: &str, en: &str) -> Value {
    let mut value = tt(standard_form, transliteration, en);
    value["phonetic_gloss"] = json!(standard_form);
    value
}

pub fn plan() -> Value {
    json!({
        "target_function": "asking prices",
        "scenarios": ["convenience store"],
        "grammar_functions": ["question with ka", "requests with kudasai"],
        "evaluation_criteria": ["asks for a price politely"]
    })
}

const TURNS: [(&str, &str, &str, &str); 3] = [
    ("Customer", "これはいくらですか", "kore wa ikura desu ka", "How much is this?"),
    ("Clerk", "ひゃくえんです", "hyaku en desu", "It is 100 yen."),
    ("Customer", "コーヒーをください", "koohii o kudasai", "Coffee, please."),
];

pub fn reading() -> Value {
    let passage: Vec<Value> = TURNS
        .iter()
        .map(|(speaker, text, romaji, en)| json!({"speaker": speaker, "text": tt(text, romaji, en)}))
        .collect();
    json!({
        "title": tt("かいもの", "kaimono", "Shopping"),
        "scenario": "convenience store",
        "passage": passage
    })
}

pub fn enhanced_turn(index: usize) -> Value {
    let (speaker, text, romaji, en) = TURNS[index % TURNS.len()];
    json!({
        "speaker": speaker,
        "text": tt_glossed(text, romaji, en),
        "notes": ["desu is the polite copula"],
        "key_phrases": [tt("ください", "kudasai", "please")]
    })
}

pub fn enhanced_batch() -> Value {
    Value::Array((0..TURNS.len()).map(enhanced_turn).collect())
}

pub fn comprehension() -> Value {
    json!({
        "instructions": tt("よんでください", "yonde kudasai", "Read the dialogue"),
        "items": [
            {
                "type": "short_answer",
                "question": tt("いくらですか", "ikura desu ka", "How much is it?"),
                "answer": "100 yen"
            },
            {
                "type": "true_false",
                "question": tt("コーヒーです", "koohii desu", "It is coffee."),
                "answer": "true"
            }
        ]
    })
}

pub fn production() -> Value {
    json!({
        "instructions": tt("かいてください", "kaite kudasai", "Write in Japanese"),
        "exercises": [{
            "type": "translation",
            "prompt": tt("おちゃ", "ocha", "Tea, please."),
            "model_answer": tt("おちゃをください", "ocha o kudasai", "Tea, please.")
        }]
    })
}

pub fn interaction() -> Value {
    json!({
        "scenario": tt("コンビニ", "konbini", "At a convenience store"),
        "activities": [{
            "type": "role_play",
            "goal": tt("ねだんをきく", "nedan o kiku", "Ask a price"),
            "prompts": [tt("いくらですか", "ikura desu ka", "How much is it?")]
        }]
    })
}

/// Pipeline stage a prompt belongs to.
pub fn stage_of(prompt: &str) -> &'static str {
    if prompt.starts_with("Plan a lesson") {
        "plan"
    } else if prompt.starts_with("Write the reading card") {
        "reading"
    } else if prompt.starts_with("Enhance each") {
        "enhance_batch"
    } else if prompt.starts_with("Enhance this") {
        "enhance_turn"
    } else if prompt.starts_with("Write comprehension") {
        "comprehension"
    } else if prompt.starts_with("Write production") {
        "production"
    } else if prompt.starts_with("Write interaction") {
        "interaction"
    } else {
        "unknown"
    }
}

/// Canned answer for `prompt`, wrapped in prose and a code fence like real output.
pub fn respond(prompt: &str) -> String {
    let value = match stage_of(prompt) {
        "plan" => plan(),
        "reading" => reading(),
        "enhance_batch" => enhanced_batch(),
        "enhance_turn" => {
            let index = TURNS.iter().position(|(_, text, _, _)| prompt.contains(text)).unwrap_or(0);
            enhanced_turn(index)
        }
        "comprehension" => comprehension(),
        "production" => production(),
        "interaction" => interaction(),
        _ => return "I am not sure what you need.".to_string(),
    };
    format!("Sure! Here is the result:\n```json\n{:#}\n```\nLet me know if you need changes.", value)
}
