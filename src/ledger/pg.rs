// src/ledger/pg.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::ledger::AttemptStore;
use crate::models::attempt::{AttemptRecord, ProgressEntry};
use crate::models::question::OptionLabel;

/// Postgres-backed attempt store.
pub struct PgAttemptStore {
    pool: PgPool,
}

impl PgAttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    question_id: String,
    subject: String,
    topic: String,
    chosen_option: String,
    was_correct: bool,
    elapsed_ms: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl AttemptRow {
    fn into_record(self) -> Result<AttemptRecord, AppError> {
        let chosen_option: OptionLabel = self
            .chosen_option
            .parse()
            .map_err(|e: String| AppError::Internal(format!("corrupt attempt row: {}", e)))?;

        Ok(AttemptRecord {
            question_id: self.question_id,
            subject: self.subject,
            topic: self.topic,
            chosen_option,
            was_correct: self.was_correct,
            elapsed_ms: self.elapsed_ms,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    subject: String,
    topic: String,
    total_attempts: i64,
    correct_attempts: i64,
    mastery: i64,
}

impl From<ProgressRow> for ProgressEntry {
    fn from(row: ProgressRow) -> Self {
        ProgressEntry {
            subject: row.subject,
            topic: row.topic,
            total_attempts: row.total_attempts,
            correct_attempts: row.correct_attempts,
            mastery: row.mastery,
        }
    }
}

#[async_trait]
impl AttemptStore for PgAttemptStore {
    async fn insert_attempt(&self, user_id: i64, attempt: &AttemptRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO attempts
                (user_id, question_id, subject, topic, chosen_option, was_correct, elapsed_ms, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user_id)
        .bind(&attempt.question_id)
        .bind(&attempt.subject)
        .bind(&attempt.topic)
        .bind(attempt.chosen_option.as_str())
        .bind(attempt.was_correct)
        .bind(attempt.elapsed_ms)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: i64,
        subject: &str,
        topic: &str,
    ) -> Result<Option<ProgressEntry>, AppError> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT subject, topic, total_attempts, correct_attempts, mastery
            FROM progress
            WHERE user_id = $1 AND subject = $2 AND topic = $3
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .bind(topic)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProgressEntry::from))
    }

    async fn upsert_progress(&self, user_id: i64, entry: &ProgressEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO progress (user_id, subject, topic, total_attempts, correct_attempts, mastery, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, CURRENT_TIMESTAMP)
            ON CONFLICT (user_id, subject, topic) DO UPDATE SET
                total_attempts = EXCLUDED.total_attempts,
                correct_attempts = EXCLUDED.correct_attempts,
                mastery = EXCLUDED.mastery,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(user_id)
        .bind(&entry.subject)
        .bind(&entry.topic)
        .bind(entry.total_attempts)
        .bind(entry.correct_attempts)
        .bind(entry.mastery)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_progress(&self, user_id: i64) -> Result<Vec<ProgressEntry>, AppError> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT subject, topic, total_attempts, correct_attempts, mastery
            FROM progress
            WHERE user_id = $1
            ORDER BY subject, topic
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProgressEntry::from).collect())
    }

    async fn recent_attempts(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<AttemptRecord>, AppError> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT question_id, subject, topic, chosen_option, was_correct, elapsed_ms, created_at
            FROM attempts
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AttemptRow::into_record).collect()
    }
}
