//! Property-based tests for the enhancement coordinator.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::core::generation::{EngineSettings, EnhancementCoordinator, GenerationEngine};
use crate::core::lesson::{DialogueTurn, EnhancementStatus};
use crate::core::schema::{Coercer, SchemaRegistry};
use crate::core::text::ScriptRunSegmenter;
use crate::tests::mocks::{user_prompt, ScriptedProvider};

const WORDS: [(&str, &str); 4] = [
    ("こんにちは", "konnichiwa"),
    ("ありがとう", "arigatou"),
    ("いくらですか", "ikura desu ka"),
    ("ください", "kudasai"),
];

fn speaker(index: usize) -> String {
    format!("S{index}")
}

fn original(index: usize) -> DialogueTurn {
    let (text, romaji) = WORDS[index % WORDS.len()];
    serde_json::from_value(json!({
        "speaker": speaker(index),
        "text": {"standard_form": text, "transliteration": romaji, "translations": {"en": "hello"}}
    }))
    .unwrap()
}

fn enhanced(index: usize) -> Value {
    let (text, romaji) = WORDS[index % WORDS.len()];
    json!({
        "speaker": speaker(index),
        "text": {
            "standard_form": text,
            "phonetic_gloss": text,
            "transliteration": romaji,
            "translations": {"en": "hello"}
        },
        "notes": [format!("note {index}")]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Batch always fails; each item succeeds or fails per `outcomes`.
    #[test]
    fn output_matches_input_for_any_failure_mix(outcomes in prop::collection::vec(any::<bool>(), 0..7)) {
        let n = outcomes.len();
        let script = outcomes.clone();
        let provider = Arc::new(ScriptedProvider::from_fn(move |request| {
            let prompt = user_prompt(request);
            if prompt.starts_with("Enhance each") {
                return Ok("[]".to_string());
            }
            let index = (0..script.len())
                .find(|i| prompt.contains(&format!("\"speaker\": \"{}\"", speaker(*i))))
                .unwrap();
            if script[index] {
                Ok(enhanced(index).to_string())
            } else {
                Ok("no idea".to_string())
            }
        }));
        let engine = GenerationEngine::new(
            provider.clone(),
            Coercer::new(Arc::new(ScriptRunSegmenter::new())),
            EngineSettings { max_repair: 0, timeout: Duration::from_secs(5), max_tokens: 128 },
            "en",
        );
        let schemas = SchemaRegistry::new();
        let turns: Vec<DialogueTurn> = (0..n).map(original).collect();

        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (out, summary) = rt.block_on(
            EnhancementCoordinator::new(&engine, &schemas, 0.3).enhance(turns.clone()),
        );

        prop_assert_eq!(out.len(), n);
        prop_assert_eq!(summary.total, n);
        prop_assert_eq!(summary.enhanced, outcomes.iter().filter(|ok| **ok).count());
        let expected_calls = if n == 0 { 0 } else { 1 + n as u32 };
        prop_assert_eq!(provider.call_count(), expected_calls);

        for (i, (turn, ok)) in out.iter().zip(&outcomes).enumerate() {
            prop_assert_eq!(&turn.speaker, &speaker(i));
            if *ok {
                prop_assert_eq!(turn.enhancement, Some(EnhancementStatus::Enhanced));
                prop_assert_eq!(turn.notes.clone(), vec![format!("note {i}")]);
            } else {
                prop_assert_eq!(turn.enhancement, Some(EnhancementStatus::Fallback));
                prop_assert_eq!(&turn.text, &turns[i].text);
                prop_assert!(turn.notes.is_empty());
            }
        }
    }
}
