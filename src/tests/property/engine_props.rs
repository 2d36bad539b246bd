//! Property-based tests for the generate-validate-repair engine.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use crate::core::generation::{
    Accepted, EngineSettings, GenerationEngine, GenerationExhausted, GenerationTask,
};
use crate::core::llm::LLMError;
use crate::core::schema::{Coercer, SchemaKind, SchemaRegistry, ValidationMode};
use crate::core::text::ScriptRunSegmenter;
use crate::tests::common;
use crate::tests::mocks::ScriptedProvider;

#[derive(Debug, Clone, Copy)]
enum BadDraft {
    Prose,
    Truncated,
    Invalid,
    Transport,
}

fn bad_draft() -> impl Strategy<Value = BadDraft> {
    prop_oneof![
        Just(BadDraft::Prose),
        Just(BadDraft::Truncated),
        Just(BadDraft::Invalid),
        Just(BadDraft::Transport),
    ]
}

fn render(draft: BadDraft) -> Result<String, LLMError> {
    match draft {
        BadDraft::Prose => Ok("I cannot produce JSON today.".to_string()),
        BadDraft::Truncated => Ok("{\"target_function\": \"asking".to_string()),
        BadDraft::Invalid => Ok("{\"scenarios\": []}".to_string()),
        BadDraft::Transport => Err(LLMError::ApiError {
            status: 502,
            message: "bad gateway".to_string(),
        }),
    }
}

fn run(
    drafts: Vec<Result<String, LLMError>>,
    max_repair: u32,
) -> (Arc<ScriptedProvider>, Result<Accepted, GenerationExhausted>) {
    let provider = Arc::new(ScriptedProvider::with_responses(drafts));
    let engine = GenerationEngine::new(
        provider.clone(),
        Coercer::new(Arc::new(ScriptRunSegmenter::new())),
        EngineSettings {
            max_repair,
            timeout: Duration::from_secs(5),
            max_tokens: 128,
        },
        "en",
    );
    let schema = SchemaRegistry::new().get(SchemaKind::Plan).cloned().unwrap();
    let task = GenerationTask::new("plan", schema, "Plan a lesson", 0.4);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let result = rt.block_on(engine.generate(&task));
    (provider, result)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn failing_generator_gets_exactly_budget_plus_one_drafts(
        max_repair in 0u32..4,
        drafts in prop::collection::vec(bad_draft(), 8),
    ) {
        let scripted = drafts.iter().map(|d| render(*d)).collect();
        let (provider, result) = run(scripted, max_repair);

        prop_assert!(result.is_err());
        prop_assert_eq!(provider.call_count(), max_repair + 1);
        prop_assert_eq!(result.unwrap_err().attempts, max_repair + 1);
    }

    #[test]
    fn first_valid_draft_ends_the_loop(
        max_repair in 0u32..4,
        bad in prop::collection::vec(bad_draft(), 0..4),
    ) {
        prop_assume!(bad.len() as u32 <= max_repair);
        let mut scripted: Vec<_> = bad.iter().map(|d| render(*d)).collect();
        scripted.push(Ok(common::plan().to_string()));
        scripted.push(Ok(common::plan().to_string()));
        let (provider, result) = run(scripted, max_repair);

        let accepted = result.unwrap();
        prop_assert_eq!(accepted.attempts, bad.len() as u32 + 1);
        prop_assert_eq!(accepted.mode, ValidationMode::Strict);
        prop_assert_eq!(provider.call_count(), bad.len() as u32 + 1);
    }
}
