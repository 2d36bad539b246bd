//! Graph Store
//!
//! Skill, vocabulary and grammar graph used by entity resolution and the mastery
//! estimator. The trait keeps callers independent of the backing database; the
//! SurrealDB implementation runs embedded on RocksDB.
//!
//! ## Records
//!
//! - `vocabulary { lemma, reading, normalized, gloss? }`
//! - `grammar { pattern, label? }`
//! - `skill { name, level, topic }` with `same_level` / `same_topic` relations
//! - `mastery { learner, skill, probability, updated_at }`, id `"{learner}:{skill}"`

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;

use super::error::{StorageError, StorageResult};

const NAMESPACE: &str = "lessonforge";
const DATABASE: &str = "graph";

const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS vocabulary SCHEMALESS;
DEFINE INDEX IF NOT EXISTS vocabulary_lemma ON vocabulary FIELDS lemma;
DEFINE INDEX IF NOT EXISTS vocabulary_reading ON vocabulary FIELDS reading;
DEFINE INDEX IF NOT EXISTS vocabulary_normalized ON vocabulary FIELDS normalized;
DEFINE TABLE IF NOT EXISTS grammar SCHEMALESS;
DEFINE TABLE IF NOT EXISTS skill SCHEMALESS;
DEFINE TABLE IF NOT EXISTS same_level TYPE RELATION SCHEMALESS;
DEFINE TABLE IF NOT EXISTS same_topic TYPE RELATION SCHEMALESS;
DEFINE TABLE IF NOT EXISTS mastery SCHEMALESS;
DEFINE INDEX IF NOT EXISTS mastery_learner ON mastery FIELDS learner;
"#;

/// Parameterized query access to the graph.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run `statement` with named `params`, returning the rows of its final statement.
    async fn query(&self, statement: &str, params: Map<String, Value>) -> StorageResult<Vec<Value>>;
}

/// Embedded SurrealDB graph store.
#[derive(Clone)]
pub struct SurrealGraphStore {
    db: Surreal<Db>,
}

impl std::fmt::Debug for SurrealGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealGraphStore").finish_non_exhaustive()
    }
}

impl SurrealGraphStore {
    /// Open (or create) the RocksDB-backed store at `path` and apply the schema.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let db = Surreal::new::<RocksDb>(path)
            .await
            .map_err(|e| StorageError::init(e.to_string()))?;
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| StorageError::init(e.to_string()))?;

        let store = Self { db };
        store.apply_schema().await?;
        tracing::info!(path = %path.display(), "graph store opened");
        Ok(store)
    }

    async fn apply_schema(&self) -> StorageResult<()> {
        self.db
            .query(SCHEMA)
            .await
            .map_err(|e| StorageError::init(e.to_string()))?
            .check()
            .map_err(|e| StorageError::init(e.to_string()))?;
        Ok(())
    }

    /// Direct access for seeding and administration.
    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[async_trait]
impl GraphStore for SurrealGraphStore {
    async fn query(&self, statement: &str, params: Map<String, Value>) -> StorageResult<Vec<Value>> {
        let mut response = self
            .db
            .query(statement.to_string())
            .bind(Value::Object(params))
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?
            .check()
            .map_err(|e| StorageError::Query(e.to_string()))?;

        let last = response.num_statements().saturating_sub(1);
        let rows: Vec<Value> = response
            .take(last)
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(rows)
    }
}

/// Build a parameter map from `(name, value)` pairs.
pub fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
