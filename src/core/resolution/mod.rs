//! Entity Resolution
//!
//! Links generated lesson text to vocabulary and grammar nodes in the graph store.
//!
//! Candidates come from the segmenter. Each candidate is expanded into a variant set
//! (surface, NFKC, hiragana, katakana, reading) and looked up against the `lemma`,
//! `reading` and `normalized` fields of vocabulary nodes. Grammar patterns are matched
//! by NFKC substring containment. Misses and malformed rows are dropped; only transport
//! failures are errors.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::config::ResolutionConfig;
use crate::core::storage::error::StorageResult;
use crate::core::storage::graph::{params, GraphStore};
use crate::core::text::{normalize, to_hiragana, to_katakana, Segmenter};

const VOCABULARY_LOOKUP: &str = "SELECT meta::id(id) AS id, lemma, reading, gloss FROM vocabulary \
     WHERE lemma IN $variants OR reading IN $variants OR normalized IN $variants LIMIT 1";

const GRAMMAR_PATTERNS: &str = "SELECT meta::id(id) AS id, pattern, label FROM grammar";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntity {
    pub id: String,
    pub lemma: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarEntity {
    pub id: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Graph nodes referenced by a lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub vocabulary: Vec<VocabularyEntity>,
    pub grammar: Vec<GrammarEntity>,
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves lesson text to graph entities, memoizing per-candidate lookups.
pub struct EntityResolver {
    graph: Arc<dyn GraphStore>,
    segmenter: Arc<dyn Segmenter>,
    cache: Mutex<LruCache<String, Option<VocabularyEntity>>>,
    max_vocabulary: usize,
    max_grammar: usize,
}

impl std::fmt::Debug for EntityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityResolver")
            .field("max_vocabulary", &self.max_vocabulary)
            .field("max_grammar", &self.max_grammar)
            .finish_non_exhaustive()
    }
}

impl EntityResolver {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        segmenter: Arc<dyn Segmenter>,
        config: &ResolutionConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            graph,
            segmenter,
            cache: Mutex::new(LruCache::new(capacity)),
            max_vocabulary: config.max_vocabulary,
            max_grammar: config.max_grammar,
        }
    }

    /// Candidate word runs across `texts`, deduplicated in order of appearance.
    pub fn candidates(&self, texts: &[&str]) -> Vec<String> {
        let mut seen = Vec::new();
        for text in texts {
            for run in self.segmenter.segment(text) {
                if !seen.contains(&run) {
                    seen.push(run);
                }
            }
        }
        seen
    }

    /// Lookup forms for one candidate, deduplicated.
    pub fn variants(&self, candidate: &str) -> Vec<String> {
        let mut variants = vec![
            candidate.to_string(),
            normalize(candidate),
            to_hiragana(candidate),
            to_katakana(candidate),
        ];
        if let Some(reading) = self.segmenter.reading(candidate) {
            variants.push(reading);
        }

        let mut unique = Vec::with_capacity(variants.len());
        for variant in variants {
            if !variant.is_empty() && !unique.contains(&variant) {
                unique.push(variant);
            }
        }
        unique
    }

    /// Resolve vocabulary and grammar entities referenced by `texts`.
    #[instrument(skip_all, fields(texts = texts.len()))]
    pub async fn resolve(&self, texts: &[&str]) -> StorageResult<ExtractedEntities> {
        let vocabulary = self.resolve_vocabulary(texts).await?;
        let grammar = self.resolve_grammar(texts).await?;

        tracing::debug!(
            vocabulary = vocabulary.len(),
            grammar = grammar.len(),
            "entities resolved"
        );
        Ok(ExtractedEntities { vocabulary, grammar })
    }

    async fn resolve_vocabulary(&self, texts: &[&str]) -> StorageResult<Vec<VocabularyEntity>> {
        let mut found: Vec<VocabularyEntity> = Vec::new();

        for candidate in self.candidates(texts) {
            if found.len() >= self.max_vocabulary {
                break;
            }
            if let Some(entity) = self.lookup(&candidate).await? {
                if !found.iter().any(|e| e.id == entity.id) {
                    found.push(entity);
                }
            }
        }

        Ok(found)
    }

    async fn lookup(&self, candidate: &str) -> StorageResult<Option<VocabularyEntity>> {
        if let Some(cached) = self.cache.lock().await.get(candidate) {
            return Ok(cached.clone());
        }

        let rows = self
            .graph
            .query(
                VOCABULARY_LOOKUP,
                params([("variants", json!(self.variants(candidate)))]),
            )
            .await?;

        let entity = rows.into_iter().next().and_then(|row| {
            serde_json::from_value::<VocabularyEntity>(row)
                .map_err(|e| tracing::warn!(candidate = %candidate, error = %e, "skipping malformed vocabulary row"))
                .ok()
        });

        self.cache.lock().await.put(candidate.to_string(), entity.clone());
        Ok(entity)
    }

    async fn resolve_grammar(&self, texts: &[&str]) -> StorageResult<Vec<GrammarEntity>> {
        let rows = self.graph.query(GRAMMAR_PATTERNS, Map::new()).await?;
        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();

        let mut found: Vec<GrammarEntity> = Vec::new();
        for row in rows {
            if found.len() >= self.max_grammar {
                break;
            }
            let entity: GrammarEntity = match serde_json::from_value(row) {
                Ok(entity) => entity,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed grammar row");
                    continue;
                }
            };
            let pattern = normalize(&entity.pattern);
            if pattern.is_empty() || found.iter().any(|g| g.id == entity.id) {
                continue;
            }
            if normalized.iter().any(|text| text.contains(&pattern)) {
                found.push(entity);
            }
        }

        Ok(found)
    }
}

/// Collect every standard form of a set of cards for resolution.
pub fn standard_forms<'a, I>(cards: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a crate::core::lesson::Card>,
{
    cards
        .into_iter()
        .flat_map(|card| card.texts())
        .map(|text| text.standard_form())
        .collect()
}
