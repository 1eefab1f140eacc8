// src/ledger/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::ledger::AttemptStore;
use crate::models::attempt::{AttemptRecord, ProgressEntry};

/// In-memory attempt store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryAttemptStore {
    attempts: RwLock<HashMap<i64, Vec<AttemptRecord>>>,
    progress: RwLock<HashMap<(i64, String, String), ProgressEntry>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn insert_attempt(&self, user_id: i64, attempt: &AttemptRecord) -> Result<(), AppError> {
        self.attempts
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(attempt.clone());
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: i64,
        subject: &str,
        topic: &str,
    ) -> Result<Option<ProgressEntry>, AppError> {
        let key = (user_id, subject.to_string(), topic.to_string());
        Ok(self.progress.read().await.get(&key).cloned())
    }

    async fn upsert_progress(&self, user_id: i64, entry: &ProgressEntry) -> Result<(), AppError> {
        let key = (user_id, entry.subject.clone(), entry.topic.clone());
        self.progress.write().await.insert(key, entry.clone());
        Ok(())
    }

    async fn list_progress(&self, user_id: i64) -> Result<Vec<ProgressEntry>, AppError> {
        let mut rows: Vec<ProgressEntry> = self
            .progress
            .read()
            .await
            .iter()
            .filter(|((uid, _, _), _)| *uid == user_id)
            .map(|(_, entry)| entry.clone())
            .collect();
        rows.sort_by(|a, b| (&a.subject, &a.topic).cmp(&(&b.subject, &b.topic)));
        Ok(rows)
    }

    async fn recent_attempts(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<AttemptRecord>, AppError> {
        let attempts = self.attempts.read().await;
        let Some(rows) = attempts.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
