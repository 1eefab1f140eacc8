// src/storage/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::question::Question;
use crate::storage::BlobStore;

/// In-memory blob store. Backs the test suite and ephemeral deployments
/// where durability across restarts does not matter.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Question>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, id: &str, question: &Question) -> Result<(), AppError> {
        self.blobs
            .write()
            .await
            .insert(id.to_string(), question.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Question, AppError> {
        self.blobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", id)))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let mut ids: Vec<String> = self
            .blobs
            .read()
            .await
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{OptionLabel, QuestionOptions};

    fn sample_question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            subject: "AP Biology".into(),
            topic: "Unit 1".into(),
            prompt: "Which organelle produces ATP?".into(),
            options: QuestionOptions {
                a: "Mitochondria".into(),
                b: "Ribosome".into(),
                c: "Nucleus".into(),
                d: "Golgi apparatus".into(),
            },
            correct_option: OptionLabel::A,
            explanation: "Cellular respiration happens in the mitochondria.".into(),
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_identical_payload() {
        let store = MemoryBlobStore::new();
        let q = sample_question("q-1");

        store.put("q-1", &q).await.unwrap();
        let fetched = store.get("q-1").await.unwrap();

        assert_eq!(fetched, q);
    }

    #[tokio::test]
    async fn get_missing_id_is_not_found() {
        let store = MemoryBlobStore::new();
        let result = store.get("nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn get_many_omits_missing_entries() {
        let store = MemoryBlobStore::new();
        store.put("q-1", &sample_question("q-1")).await.unwrap();
        store.put("q-3", &sample_question("q-3")).await.unwrap();

        let ids = vec!["q-1".to_string(), "q-2".to_string(), "q-3".to_string()];
        let found = store.get_many(&ids).await;

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|q| q.id == "q-1" || q.id == "q-3"));
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let store = MemoryBlobStore::new();
        store.put("ap-bio-1", &sample_question("ap-bio-1")).await.unwrap();
        store.put("ap-bio-2", &sample_question("ap-bio-2")).await.unwrap();
        store.put("ap-chem-1", &sample_question("ap-chem-1")).await.unwrap();

        let ids = store.list("ap-bio-").await.unwrap();
        assert_eq!(ids, vec!["ap-bio-1".to_string(), "ap-bio-2".to_string()]);
    }
}
