// src/cache/entry.rs

use serde::Serialize;

use crate::models::question::Question;

/// Cache key: one concrete (subject, unit) pair.
///
/// Sentinel topics ("all units", unit ranges) are resolved to a concrete unit
/// by the API layer before they ever reach the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subject: String,
    pub topic: String,
}

impl CacheKey {
    pub fn new(subject: &str, topic: &str) -> Self {
        Self {
            subject: subject.to_string(),
            topic: topic.to_string(),
        }
    }
}

/// The most recently generated question for a key.
///
/// Holds a denormalized copy of the question for zero-I/O serving; the blob
/// store remains the durable owner. Entries are replaced whole, never
/// partially updated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub question: Question,
    pub last_written_at: chrono::DateTime<chrono::Utc>,
}

impl CacheEntry {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            last_written_at: chrono::Utc::now(),
        }
    }

    pub fn question_id(&self) -> &str {
        &self.question.id
    }
}

/// Read-only cache introspection.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub per_subject: Vec<SubjectCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectCount {
    pub subject: String,
    pub count: usize,
}
