//! Mastery Estimator
//!
//! Exponentially weighted mastery probability per (learner, skill), stored in the graph
//! and updated from learner evidence. Related skills are recommended by following
//! `same_level` and `same_topic` edges.
//!
//! Updates read then write without serialization; two concurrent updates for the same
//! pair may lose one observation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use crate::core::storage::error::StorageResult;
use crate::core::storage::graph::{params, GraphStore};
use crate::core::storage::lessons::LessonRepository;

/// Weight of the previous probability in an update.
pub const PRIOR_WEIGHT: f64 = 0.7;
/// Weight of the new observation in an update.
pub const OBSERVATION_WEIGHT: f64 = 0.3;

const READ_MASTERY: &str = "SELECT probability FROM type::thing('mastery', $key)";

const WRITE_MASTERY: &str = "UPSERT type::thing('mastery', $key) SET learner = $learner, \
     skill = $skill, probability = $probability, updated_at = time::now() RETURN NONE";

const SAME_LEVEL: &str =
    "SELECT meta::id(out) AS skill FROM same_level WHERE in = type::thing('skill', $skill)";

const SAME_TOPIC: &str =
    "SELECT meta::id(out) AS skill FROM same_topic WHERE in = type::thing('skill', $skill)";

const LEARNER_MASTERY: &str =
    "SELECT skill, probability FROM mastery WHERE learner = $learner AND skill IN $skills";

/// Combine a prior probability with a new score.
///
/// `0.7·p + 0.3·s` when a prior exists, otherwise `s`; the result is clamped to
/// `[0, 1]`. Non-finite inputs count as 0.
pub fn update_mastery(prior: Option<f64>, score: f64) -> f64 {
    let finite = |x: f64| if x.is_finite() { x } else { 0.0 };
    let score = finite(score);
    let updated = match prior {
        Some(p) => PRIOR_WEIGHT * finite(p) + OBSERVATION_WEIGHT * score,
        None => score,
    };
    updated.clamp(0.0, 1.0)
}

// ============================================================================
// Types
// ============================================================================

/// One observation of learner performance. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub learner: String,
    pub skill: String,
    /// Lesson stage that produced the observation, e.g. `"comprehension"`
    pub stage: String,
    pub correct: bool,
    /// Explicit score in `[0, 1]`; derived from `correct` when absent
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub raw_response: String,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl EvidenceRecord {
    /// Score used for the mastery update.
    pub fn effective_score(&self) -> f64 {
        self.score
            .unwrap_or(if self.correct { 1.0 } else { 0.0 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    SameLevel,
    SameTopic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub skill: String,
    pub relation: Relation,
    /// The learner's current mastery of the skill, if any evidence exists
    pub mastery: Option<f64>,
}

// ============================================================================
// Estimator
// ============================================================================

pub struct MasteryEstimator {
    graph: Arc<dyn GraphStore>,
    repository: Arc<dyn LessonRepository>,
}

impl std::fmt::Debug for MasteryEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasteryEstimator").finish_non_exhaustive()
    }
}

fn mastery_key(learner: &str, skill: &str) -> String {
    format!("{learner}:{skill}")
}

impl MasteryEstimator {
    pub fn new(graph: Arc<dyn GraphStore>, repository: Arc<dyn LessonRepository>) -> Self {
        Self { graph, repository }
    }

    /// Current mastery for a pair, if one has been recorded.
    pub async fn probability(&self, learner: &str, skill: &str) -> StorageResult<Option<f64>> {
        let rows = self
            .graph
            .query(
                READ_MASTERY,
                params([("key", json!(mastery_key(learner, skill)))]),
            )
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get("probability"))
            .and_then(Value::as_f64))
    }

    /// Append `evidence` and fold it into the learner's mastery. Returns the new probability.
    #[instrument(skip(self, evidence), fields(learner = %evidence.learner, skill = %evidence.skill))]
    pub async fn record(&self, evidence: &EvidenceRecord) -> StorageResult<f64> {
        self.repository.append_evidence(evidence).await?;

        let prior = self.probability(&evidence.learner, &evidence.skill).await?;
        let updated = update_mastery(prior, evidence.effective_score());

        self.graph
            .query(
                WRITE_MASTERY,
                params([
                    ("key", json!(mastery_key(&evidence.learner, &evidence.skill))),
                    ("learner", json!(evidence.learner)),
                    ("skill", json!(evidence.skill)),
                    ("probability", json!(updated)),
                ]),
            )
            .await?;

        tracing::debug!(prior = ?prior, updated, "mastery updated");
        Ok(updated)
    }

    /// Skills related to `skill`: `same_level` neighbours first, then `same_topic`.
    ///
    /// The skill itself is excluded, duplicates keep their first relation, and each
    /// result carries the learner's current mastery if known.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        learner: &str,
        skill: &str,
        limit: usize,
    ) -> StorageResult<Vec<Recommendation>> {
        let mut related: Vec<(String, Relation)> = Vec::new();

        for (statement, relation) in [(SAME_LEVEL, Relation::SameLevel), (SAME_TOPIC, Relation::SameTopic)] {
            let rows = self
                .graph
                .query(statement, params([("skill", json!(skill))]))
                .await?;
            for row in rows {
                let Some(neighbour) = row.get("skill").and_then(Value::as_str) else {
                    continue;
                };
                if neighbour != skill && !related.iter().any(|(s, _)| s == neighbour) {
                    related.push((neighbour.to_string(), relation));
                }
            }
        }
        related.truncate(limit);

        if related.is_empty() {
            return Ok(Vec::new());
        }

        let skills: Vec<&str> = related.iter().map(|(s, _)| s.as_str()).collect();
        let rows = self
            .graph
            .query(
                LEARNER_MASTERY,
                params([("learner", json!(learner)), ("skills", json!(skills))]),
            )
            .await?;

        let mastery_of = |target: &str| {
            rows.iter()
                .find(|row| row.get("skill").and_then(Value::as_str) == Some(target))
                .and_then(|row| row.get("probability"))
                .and_then(Value::as_f64)
        };

        Ok(related
            .iter()
            .map(|(skill, relation)| Recommendation {
                skill: skill.clone(),
                relation: *relation,
                mastery: mastery_of(skill),
            })
            .collect())
    }
}
