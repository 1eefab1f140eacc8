// src/storage/mod.rs

pub mod fs;
pub mod memory;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::question::Question;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// Durable home of question payloads, addressed by opaque id.
///
/// Writes are effectively write-once: callers always supply fresh UUIDs, and
/// overwriting an existing id is outside the contract.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persists a question under the given id.
    async fn put(&self, id: &str, question: &Question) -> Result<(), AppError>;

    /// Retrieves a question by exact id.
    async fn get(&self, id: &str) -> Result<Question, AppError>;

    /// Enumerates stored ids beginning with `prefix`. Administrative use
    /// only; never on the request hot path.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, AppError>;

    /// Best-effort batch fetch. Individual failures are logged and the
    /// missing entries omitted rather than failing the whole batch.
    async fn get_many(&self, ids: &[String]) -> Vec<Question> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(id).await {
                Ok(q) => found.push(q),
                Err(e) => {
                    tracing::warn!("Skipping blob {} in batch fetch: {}", id, e);
                }
            }
        }
        found
    }
}
