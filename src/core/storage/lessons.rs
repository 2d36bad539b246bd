//! Lesson Repository
//!
//! Relational persistence for lesson descriptors, compiled lessons and learner
//! evidence. Compiled lessons are written once per successful compile; evidence is
//! append-only.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use super::error::{StorageError, StorageResult};
use crate::core::lesson::{LessonDescriptor, LessonRoot};
use crate::core::mastery::EvidenceRecord;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS descriptors (
        id TEXT PRIMARY KEY,
        level TEXT NOT NULL,
        topic TEXT NOT NULL,
        can_do TEXT NOT NULL,
        objectives TEXT NOT NULL DEFAULT '[]',
        vocabulary_hints TEXT NOT NULL DEFAULT '[]',
        grammar_hints TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lessons (
        id TEXT PRIMARY KEY,
        descriptor_id TEXT NOT NULL,
        version INTEGER NOT NULL,
        metatext_locale TEXT NOT NULL,
        document TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (descriptor_id, version)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS evidence (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        learner TEXT NOT NULL,
        skill TEXT NOT NULL,
        stage TEXT NOT NULL,
        correct INTEGER NOT NULL,
        score REAL,
        raw_response TEXT NOT NULL,
        recorded_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_evidence_learner_skill ON evidence (learner, skill)",
];

/// Relational store operations used by the compiler and the mastery estimator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn load_descriptor(&self, id: &str) -> StorageResult<Option<LessonDescriptor>>;

    /// Highest persisted version for `descriptor_id`, if any lesson was saved.
    async fn latest_version(&self, descriptor_id: &str) -> StorageResult<Option<u32>>;

    async fn save_lesson(&self, lesson: &LessonRoot) -> StorageResult<()>;

    async fn append_evidence(&self, evidence: &EvidenceRecord) -> StorageResult<()>;
}

/// SQLite-backed [`LessonRepository`].
#[derive(Debug, Clone)]
pub struct SqliteLessonRepository {
    pool: SqlitePool,
}

impl SqliteLessonRepository {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::init(e.to_string()))?;

        let repo = Self { pool };
        repo.ensure_schema().await?;
        tracing::info!(path = %path.display(), "lesson store opened");
        Ok(repo)
    }

    /// In-memory database, for tests and dry runs.
    pub async fn in_memory() -> StorageResult<Self> {
        // One connection: every pooled connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StorageError::init(e.to_string()))?;

        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> StorageResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace a descriptor.
    pub async fn upsert_descriptor(&self, descriptor: &LessonDescriptor) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO descriptors
                (id, level, topic, can_do, objectives, vocabulary_hints, grammar_hints)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&descriptor.id)
        .bind(&descriptor.level)
        .bind(&descriptor.topic)
        .bind(&descriptor.can_do)
        .bind(serde_json::to_string(&descriptor.objectives)?)
        .bind(serde_json::to_string(&descriptor.vocabulary_hints)?)
        .bind(serde_json::to_string(&descriptor.grammar_hints)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load a stored lesson document by id.
    pub async fn load_lesson(&self, lesson_id: &str) -> StorageResult<Option<LessonRoot>> {
        let row = sqlx::query("SELECT document FROM lessons WHERE id = ?")
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document")?;
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    /// Evidence rows for one learner and skill, oldest first.
    pub async fn evidence_for(&self, learner: &str, skill: &str) -> StorageResult<Vec<EvidenceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT learner, skill, stage, correct, score, raw_response, recorded_at
            FROM evidence WHERE learner = ? AND skill = ? ORDER BY id
            "#,
        )
        .bind(learner)
        .bind(skill)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> StorageResult<EvidenceRecord> {
                Ok(EvidenceRecord {
                    learner: row.try_get("learner")?,
                    skill: row.try_get("skill")?,
                    stage: row.try_get("stage")?,
                    correct: row.try_get::<i64, _>("correct")? != 0,
                    score: row.try_get("score")?,
                    raw_response: row.try_get("raw_response")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }
}

fn json_list(row: &sqlx::sqlite::SqliteRow, column: &str) -> StorageResult<Vec<String>> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| StorageError::corrupt(format!("descriptor column {column}: {e}")))
}

#[async_trait]
impl LessonRepository for SqliteLessonRepository {
    async fn load_descriptor(&self, id: &str) -> StorageResult<Option<LessonDescriptor>> {
        let row = sqlx::query("SELECT * FROM descriptors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(LessonDescriptor {
            id: row.try_get("id")?,
            level: row.try_get("level")?,
            topic: row.try_get("topic")?,
            can_do: row.try_get("can_do")?,
            objectives: json_list(&row, "objectives")?,
            vocabulary_hints: json_list(&row, "vocabulary_hints")?,
            grammar_hints: json_list(&row, "grammar_hints")?,
        }))
    }

    async fn latest_version(&self, descriptor_id: &str) -> StorageResult<Option<u32>> {
        let row = sqlx::query("SELECT MAX(version) AS max_version FROM lessons WHERE descriptor_id = ?")
            .bind(descriptor_id)
            .fetch_one(&self.pool)
            .await?;

        let max: Option<i64> = row.try_get("max_version")?;
        Ok(max.map(|v| v as u32))
    }

    async fn save_lesson(&self, lesson: &LessonRoot) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO lessons (id, descriptor_id, version, metatext_locale, document, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(lesson.lesson_id.to_string())
        .bind(&lesson.descriptor_id)
        .bind(lesson.version as i64)
        .bind(&lesson.metatext_locale)
        .bind(serde_json::to_string(lesson)?)
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_evidence(&self, evidence: &EvidenceRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO evidence (learner, skill, stage, correct, score, raw_response, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&evidence.learner)
        .bind(&evidence.skill)
        .bind(&evidence.stage)
        .bind(evidence.correct)
        .bind(evidence.score)
        .bind(&evidence.raw_response)
        .bind(evidence.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
