// src/cache/coordinator.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::timeout;
use uuid::Uuid;

use crate::cache::{CacheEntry, CacheKey, CacheStats, SubjectCount};
use crate::error::AppError;
use crate::generation::QuestionGenerator;
use crate::models::question::Question;
use crate::storage::BlobStore;

/// The question cache coordinator. Cheap to clone; clones share state.
///
/// Per key the lifecycle is Absent -> Populated -> Refreshing -> Populated.
/// A warm hit is served straight from the entry table and kicks off at most
/// one background regeneration per key; a cold miss generates synchronously.
/// The blob write for a new question always precedes the entry update that
/// references it, so a reader can never see an id the store does not have.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    /// Keys with a background refresh currently in flight.
    in_flight: RwLock<HashSet<CacheKey>>,
    store: Arc<dyn BlobStore>,
    generator: Arc<dyn QuestionGenerator>,
    generation_timeout: Duration,
}

/// What to do when the blob write fails after a successful generation.
#[derive(Debug, Clone, Copy)]
enum PersistFailure {
    /// Fail the whole operation (cold miss, prime, background refresh).
    Propagate,
    /// Log and return the question anyway (force-fresh pre-fetches).
    Tolerate,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn BlobStore>,
        generator: Arc<dyn QuestionGenerator>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                in_flight: RwLock::new(HashSet::new()),
                store,
                generator,
                generation_timeout,
            }),
        }
    }

    /// Serves a question for the key.
    ///
    /// * `force_fresh` — always generate synchronously (used by pre-fetch
    ///   requests that want a brand new question now). The result still lands
    ///   in the cache, but a persist failure only costs the caching, not the
    ///   response.
    /// * Warm hit — the stored entry is returned immediately and a background
    ///   regeneration is scheduled unless one is already running for the key.
    /// * Cold miss — synchronous generate -> persist -> populate; any failure
    ///   propagates and no entry is created.
    ///
    /// Returns the question and whether it was served from the cache.
    pub async fn fetch(
        &self,
        subject: &str,
        topic: &str,
        force_fresh: bool,
    ) -> Result<(Question, bool), AppError> {
        let key = CacheKey::new(subject, topic);

        if force_fresh {
            let question = self
                .generate_detached(key, PersistFailure::Tolerate)
                .await?;
            return Ok((question, false));
        }

        let cached = self.inner.entries.read().await.get(&key).cloned();
        if let Some(entry) = cached {
            self.schedule_refresh(key).await;
            return Ok((entry.question, true));
        }

        let question = self
            .generate_detached(key, PersistFailure::Propagate)
            .await?;
        Ok((question, false))
    }

    /// Forced synchronous generate + persist + populate; equivalent to the
    /// cold-miss path of `fetch`. Administrative surface.
    pub async fn prime(&self, subject: &str, topic: &str) -> Result<Question, AppError> {
        let key = CacheKey::new(subject, topic);
        self.generate_detached(key, PersistFailure::Propagate).await
    }

    /// Drops the entry for the key, forcing the next `fetch` back onto the
    /// cold-miss path. Idempotent.
    pub async fn invalidate(&self, subject: &str, topic: &str) {
        let key = CacheKey::new(subject, topic);
        if self.inner.entries.write().await.remove(&key).is_some() {
            tracing::info!("Invalidated cache entry for {} / {}", subject, topic);
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.inner.entries.read().await;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for key in entries.keys() {
            *counts.entry(key.subject.clone()).or_default() += 1;
        }

        CacheStats {
            total_entries: entries.len(),
            per_subject: counts
                .into_iter()
                .map(|(subject, count)| SubjectCount { subject, count })
                .collect(),
        }
    }

    /// Runs the generate/persist/populate sequence on a spawned task and
    /// awaits it. If the requester goes away mid-flight the task still runs
    /// to completion, so the generated question is persisted and cached for
    /// a future reader even though nobody is listening anymore.
    async fn generate_detached(
        &self,
        key: CacheKey,
        on_persist_failure: PersistFailure,
    ) -> Result<Question, AppError> {
        let inner = Arc::clone(&self.inner);
        let handle =
            tokio::spawn(async move { inner.generate_and_install(&key, on_persist_failure).await });

        handle
            .await
            .map_err(|e| AppError::Internal(format!("generation task panicked: {}", e)))?
    }

    /// Spawns a background regeneration for the key unless one is already in
    /// flight. Failures are logged and swallowed; the stale entry stays.
    async fn schedule_refresh(&self, key: CacheKey) {
        {
            let mut in_flight = self.inner.in_flight.write().await;
            if !in_flight.insert(key.clone()) {
                return;
            }
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = inner
                .generate_and_install(&key, PersistFailure::Propagate)
                .await
            {
                tracing::warn!(
                    "Background refresh failed for {} / {}; keeping stale entry: {}",
                    key.subject,
                    key.topic,
                    e
                );
            }
            inner.in_flight.write().await.remove(&key);
        });
    }
}

impl Inner {
    /// Generate -> persist -> atomically replace the entry.
    async fn generate_and_install(
        &self,
        key: &CacheKey,
        on_persist_failure: PersistFailure,
    ) -> Result<Question, AppError> {
        let generation = self.generator.generate(&key.subject, &key.topic);
        let draft = match timeout(self.generation_timeout, generation).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::Generation(format!(
                    "generation timed out after {}s",
                    self.generation_timeout.as_secs()
                )));
            }
        };

        let question = Question {
            id: Uuid::new_v4().to_string(),
            subject: key.subject.clone(),
            topic: key.topic.clone(),
            prompt: draft.prompt,
            options: draft.options,
            correct_option: draft.correct_option,
            explanation: draft.explanation,
        };

        // The blob write must complete before the entry points at the new id.
        match self.store.put(&question.id, &question).await {
            Ok(()) => {
                self.entries
                    .write()
                    .await
                    .insert(key.clone(), CacheEntry::new(question.clone()));
            }
            Err(e) => match on_persist_failure {
                PersistFailure::Propagate => return Err(e),
                PersistFailure::Tolerate => {
                    tracing::warn!(
                        "Serving unpersisted question for {} / {}: {}",
                        key.subject,
                        key.topic,
                        e
                    );
                }
            },
        }

        Ok(question)
    }
}
