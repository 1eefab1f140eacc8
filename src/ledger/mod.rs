// src/ledger/mod.rs

pub mod memory;
pub mod pg;

use std::sync::Arc;

use async_trait::async_trait;
use validator::Validate;

use crate::accounts::UserStore;
use crate::error::AppError;
use crate::models::attempt::{
    AttemptRecord, ProgressEntry, RecordAttemptRequest, RecordAttemptResponse,
};
use crate::models::question::OptionLabel;

pub use memory::MemoryAttemptStore;
pub use pg::PgAttemptStore;

/// Persistence seam for attempts and progress counters.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Appends one attempt to the user's history.
    async fn insert_attempt(&self, user_id: i64, attempt: &AttemptRecord) -> Result<(), AppError>;

    /// Current progress counters for one (user, subject, topic) key.
    async fn get_progress(
        &self,
        user_id: i64,
        subject: &str,
        topic: &str,
    ) -> Result<Option<ProgressEntry>, AppError>;

    /// Replaces the progress row for the entry's (subject, topic) key.
    async fn upsert_progress(&self, user_id: i64, entry: &ProgressEntry) -> Result<(), AppError>;

    /// All progress rows for a user.
    async fn list_progress(&self, user_id: i64) -> Result<Vec<ProgressEntry>, AppError>;

    /// Most recent attempts, newest first.
    async fn recent_attempts(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<AttemptRecord>, AppError>;
}

/// Rounded mastery percentage, an integer in [0, 100].
///
/// Always recomputed from the raw counters rather than maintained as a
/// running average, so it cannot drift.
pub fn mastery(correct_attempts: i64, total_attempts: i64) -> i64 {
    if total_attempts <= 0 {
        return 0;
    }
    ((100.0 * correct_attempts as f64) / total_attempts as f64).round() as i64
}

/// The attempt/progress ledger.
///
/// Records per-user answer attempts against question references handed out by
/// the question fetch flow, and derives mastery statistics. It never
/// generates questions itself.
pub struct ProgressLedger {
    users: Arc<dyn UserStore>,
    attempts: Arc<dyn AttemptStore>,
}

impl ProgressLedger {
    pub fn new(users: Arc<dyn UserStore>, attempts: Arc<dyn AttemptStore>) -> Self {
        Self { users, attempts }
    }

    /// Appends an attempt and upserts the progress entry for its key.
    ///
    /// Fails with `Validation` on malformed input and `NotFound` when the
    /// user does not exist. The question_id precondition (must come from a
    /// prior fetch) is the caller's responsibility.
    pub async fn record_attempt(
        &self,
        user_id: i64,
        req: RecordAttemptRequest,
    ) -> Result<RecordAttemptResponse, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let chosen_option: OptionLabel = req
            .chosen_option
            .parse()
            .map_err(|e: String| AppError::Validation(e))?;

        let attempt = AttemptRecord {
            question_id: req.question_id,
            subject: req.subject,
            topic: req.topic,
            chosen_option,
            was_correct: req.was_correct,
            elapsed_ms: req.elapsed_ms,
            created_at: chrono::Utc::now(),
        };

        self.attempts.insert_attempt(user_id, &attempt).await?;

        let previous = self
            .attempts
            .get_progress(user_id, &attempt.subject, &attempt.topic)
            .await?;

        let (total, correct) = match previous {
            Some(p) => (
                p.total_attempts + 1,
                p.correct_attempts + i64::from(attempt.was_correct),
            ),
            None => (1, i64::from(attempt.was_correct)),
        };

        let entry = ProgressEntry {
            subject: attempt.subject.clone(),
            topic: attempt.topic.clone(),
            total_attempts: total,
            correct_attempts: correct,
            mastery: mastery(correct, total),
        };

        self.attempts.upsert_progress(user_id, &entry).await?;

        Ok(RecordAttemptResponse {
            mastery: entry.mastery,
            total_attempts: entry.total_attempts,
        })
    }

    pub async fn progress(&self, user_id: i64) -> Result<Vec<ProgressEntry>, AppError> {
        self.attempts.list_progress(user_id).await
    }

    pub async fn history(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<AttemptRecord>, AppError> {
        self.attempts.recent_attempts(user_id, limit).await
    }
}
