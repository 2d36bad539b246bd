//! Compile Pipeline Integration Tests
//!
//! Full compiles against a scripted generator, an in-memory SQLite lesson store and a
//! mocked graph store.

use std::sync::Arc;

use serde_json::json;

use crate::config::AppConfig;
use crate::core::lesson::{Card, CardKind, CardSlot, EnhancementStatus};
use crate::core::llm::{LLMError, ProviderRegistry};
use crate::core::pipeline::{CompileError, CompileRequest, LessonCompiler, Stage, UPSTREAM_UNAVAILABLE};
use crate::core::resolution::EntityResolver;
use crate::core::storage::graph::MockGraphStore;
use crate::core::storage::{LessonRepository, SqliteLessonRepository};
use crate::core::text::ScriptRunSegmenter;
use crate::tests::common::{self, stage_of, DESCRIPTOR_ID};
use crate::tests::mocks::{user_prompt, ScriptedProvider};

const SELECTOR: &str = "scripted";

struct Harness {
    compiler: LessonCompiler,
    provider: Arc<ScriptedProvider>,
    repository: Arc<SqliteLessonRepository>,
}

impl Harness {
    fn stages_called(&self) -> Vec<&'static str> {
        self.provider.prompts().iter().map(|p| stage_of(p)).collect()
    }
}

fn graph() -> MockGraphStore {
    let mut graph = MockGraphStore::new();
    graph
        .expect_query()
        .withf(|stmt, _| stmt.starts_with("SELECT meta::id(id) AS id, lemma"))
        .returning(|_, params| {
            let variants = params["variants"].as_array().cloned().unwrap_or_default();
            if variants.contains(&json!("コーヒー")) {
                Ok(vec![json!({"id": "coffee", "lemma": "コーヒー", "reading": "こーひー", "gloss": "coffee"})])
            } else {
                Ok(vec![])
            }
        });
    graph
        .expect_query()
        .withf(|stmt, _| stmt.starts_with("SELECT meta::id(id) AS id, pattern"))
        .returning(|_, _| {
            Ok(vec![
                json!({"id": "kudasai", "pattern": "ください", "label": "polite request"}),
                json!({"id": "keredomo", "pattern": "けれども"}),
            ])
        });
    graph
}

/// Build a compiler whose generator answers with `responder(prompt)`.
async fn harness<F>(responder: F) -> Harness
where
    F: Fn(&str) -> Result<String, LLMError> + Send + Sync + 'static,
{
    let provider = Arc::new(ScriptedProvider::from_fn(move |request| responder(&user_prompt(request))));
    let mut providers = ProviderRegistry::new();
    providers.register(SELECTOR, provider.clone());

    let repository = Arc::new(SqliteLessonRepository::in_memory().await.unwrap());
    repository.upsert_descriptor(&common::descriptor()).await.unwrap();

    let segmenter = Arc::new(ScriptRunSegmenter::new());
    let mut config = AppConfig::default();
    config.default_model = SELECTOR.to_string();
    config.generation.max_repair = 1;
    config.generation.timeout_secs = 5;
    let resolver = Arc::new(EntityResolver::new(Arc::new(graph()), segmenter.clone(), &config.resolution));

    let compiler = LessonCompiler::new(providers, repository.clone(), resolver, segmenter, &config);
    Harness {
        compiler,
        provider,
        repository,
    }
}

fn canned(prompt: &str) -> Result<String, LLMError> {
    Ok(common::respond(prompt))
}

fn request() -> CompileRequest {
    CompileRequest::new(DESCRIPTOR_ID, "en")
}

// =============================================================================
// Successful Compiles
// =============================================================================

#[tokio::test]
async fn test_full_compile_persists_lesson() {
    let h = harness(canned).await;

    let response = h.compiler.compile(&request()).await.unwrap();

    assert_eq!(response.version, 1);
    assert!(response.persisted);
    assert!(response.absent_cards.is_empty());
    assert_eq!(response.enhancement.enhanced, 3);
    assert_eq!(
        h.stages_called(),
        vec!["plan", "reading", "enhance_batch", "comprehension", "production", "interaction"]
    );

    let lesson = &response.lesson;
    assert_eq!(lesson.model, SELECTOR);
    assert_eq!(lesson.plan.target_function, "asking prices");
    let reading = lesson.reading.card().and_then(Card::as_reading).unwrap();
    assert_eq!(reading.passage.len(), 3);
    assert!(reading
        .passage
        .iter()
        .all(|t| t.enhancement == Some(EnhancementStatus::Enhanced) && t.text.phonetic_gloss().is_some()));
    assert_eq!(lesson.entities.vocabulary[0].id, "coffee");
    let grammar: Vec<&str> = lesson.entities.grammar.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(grammar, vec!["kudasai"]);

    let stored = h
        .repository
        .load_lesson(&response.lesson_id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&stored, lesson);
}

#[tokio::test]
async fn test_versions_increase_per_descriptor() {
    let h = harness(canned).await;

    let first = h.compiler.compile(&request()).await.unwrap();
    let second = h.compiler.compile(&request()).await.unwrap();

    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_ne!(first.lesson_id, second.lesson_id);
    assert_eq!(h.repository.latest_version(DESCRIPTOR_ID).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_dry_run_skips_persistence() {
    let h = harness(canned).await;

    let response = h.compiler.compile(&request().dry_run()).await.unwrap();

    assert!(!response.persisted);
    assert_eq!(response.version, 1);
    assert_eq!(h.repository.latest_version(DESCRIPTOR_ID).await.unwrap(), None);
}

#[tokio::test]
async fn test_bare_string_accepted_after_coercion() {
    let h = harness(|prompt| {
        if stage_of(prompt) == "comprehension" {
            let mut card = common::comprehension();
            card["items"][0]["question"] = json!("なにをかいましたか");
            Ok(card.to_string())
        } else {
            canned(prompt)
        }
    })
    .await;

    let response = h.compiler.compile(&request()).await.unwrap();

    let Some(Card::Comprehension(card)) = response.lesson.comprehension.card() else {
        panic!("comprehension card missing");
    };
    let question = &card.items[0].question;
    assert_eq!(question.translation("en"), Some("なにをかいましたか"));
    assert_eq!(question.transliteration(), "naniokaimashitaka");
    // Initial draft plus one repair
    let comprehension_calls = h.stages_called().iter().filter(|s| **s == "comprehension").count();
    assert_eq!(comprehension_calls, 2);
}

#[tokio::test]
async fn test_enhancement_falls_back_per_turn() {
    let h = harness(|prompt| match stage_of(prompt) {
        "enhance_batch" => Ok("[]".to_string()),
        "enhance_turn" if prompt.contains("ひゃくえんです") => Ok("no".to_string()),
        "enhance_turn" if prompt.contains("コーヒーをください") => Ok(common::enhanced_turn(2).to_string()),
        _ => canned(prompt),
    })
    .await;

    let response = h.compiler.compile(&request()).await.unwrap();

    assert_eq!(response.enhancement.enhanced, 2);
    assert_eq!(response.enhancement.fallback, 1);
    let reading = response.lesson.reading.card().and_then(Card::as_reading).unwrap();
    let statuses: Vec<_> = reading.passage.iter().map(|t| t.enhancement).collect();
    assert_eq!(
        statuses,
        vec![
            Some(EnhancementStatus::Enhanced),
            Some(EnhancementStatus::Fallback),
            Some(EnhancementStatus::Enhanced),
        ]
    );
    assert_eq!(reading.passage[1].text.phonetic_gloss(), None);
    assert_eq!(reading.passage[1].speaker, "Clerk");
}

// =============================================================================
// Failures and Partial Compiles
// =============================================================================

#[tokio::test]
async fn test_exhausted_card_fails_request() {
    let h = harness(|prompt| {
        if stage_of(prompt) == "production" {
            Ok(json!({"instructions": "x", "exercises": [{"type": "essay"}]}).to_string())
        } else {
            canned(prompt)
        }
    })
    .await;

    let err = h.compiler.compile(&request()).await.unwrap_err();

    match &err {
        CompileError::Generation { stage, card, source } => {
            assert_eq!(*stage, Stage::Card);
            assert_eq!(*card, Some(CardKind::Production));
            assert_eq!(source.attempts, 2);
            assert!(source.violations.iter().any(|v| v.path == "exercises[0].type"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.repository.latest_version(DESCRIPTOR_ID).await.unwrap(), None);
}

#[tokio::test]
async fn test_partial_compile_records_absent_card() {
    let h = harness(|prompt| {
        if stage_of(prompt) == "production" {
            Ok("{\"exercises\": 3}".to_string())
        } else {
            canned(prompt)
        }
    })
    .await;

    let response = h.compiler.compile(&request().partial()).await.unwrap();

    assert_eq!(response.absent_cards, vec![CardKind::Production]);
    assert!(response.persisted);
    match &response.lesson.production {
        CardSlot::Absent { reason, violations } => {
            assert!(reason.contains("production"));
            assert!(!violations.is_empty());
        }
        CardSlot::Present { .. } => panic!("production card should be absent"),
    }
    assert!(response.lesson.comprehension.card().is_some());
    assert!(response.lesson.interaction.card().is_some());
}

#[tokio::test]
async fn test_absent_reading_skips_dependent_cards() {
    let h = harness(|prompt| {
        if stage_of(prompt) == "reading" {
            Ok("The reading is coming soon.".to_string())
        } else {
            canned(prompt)
        }
    })
    .await;

    let response = h.compiler.compile(&request().partial()).await.unwrap();

    assert_eq!(response.absent_cards, CardKind::ALL.to_vec());
    for kind in CardKind::DEPENDENT {
        match response.lesson.slot(kind) {
            CardSlot::Absent { reason, .. } => assert_eq!(reason, UPSTREAM_UNAVAILABLE),
            CardSlot::Present { .. } => panic!("{kind} should be absent"),
        }
    }
    assert_eq!(h.stages_called(), vec!["plan", "reading", "reading"]);
    assert_eq!(response.enhancement.total, 0);
}

#[tokio::test]
async fn test_plan_failure_is_fatal_even_when_partial() {
    let h = harness(|prompt| {
        if stage_of(prompt) == "plan" {
            Err(LLMError::Timeout(5))
        } else {
            canned(prompt)
        }
    })
    .await;

    let err = h.compiler.compile(&request().partial()).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Plan);
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test]
async fn test_request_validation_precedes_generation() {
    let h = harness(canned).await;

    let err = h
        .compiler
        .compile(&request().with_model("unknown"))
        .await
        .unwrap_err();
    match err {
        CompileError::UnknownModel { selector, available } => {
            assert_eq!(selector, "unknown");
            assert_eq!(available, SELECTOR);
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = h
        .compiler
        .compile(&CompileRequest::new(DESCRIPTOR_ID, "日本語"))
        .await
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidLocale(_)));

    let err = h
        .compiler
        .compile(&CompileRequest::new("missing", "en"))
        .await
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownDescriptor(id) if id == "missing"));

    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_request_repair_budget_overrides_config() {
    let h = harness(|prompt| {
        if stage_of(prompt) == "interaction" {
            Ok("nothing".to_string())
        } else {
            canned(prompt)
        }
    })
    .await;

    let response = h
        .compiler
        .compile(&request().partial().with_max_repair(3))
        .await
        .unwrap();

    assert_eq!(response.absent_cards, vec![CardKind::Interaction]);
    let interaction_calls = h.stages_called().iter().filter(|s| **s == "interaction").count();
    assert_eq!(interaction_calls, 4);
}
