// src/storage/fs.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::AppError;
use crate::models::question::Question;
use crate::storage::BlobStore;

/// Filesystem-backed blob store: one JSON file per question under the data
/// directory. An object-storage adapter would slot in behind the same trait.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("creating blob dir {:?}: {}", dir, e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, id: &str, question: &Question) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(question)
            .map_err(|e| AppError::Storage(format!("serializing question {}: {}", id, e)))?;

        fs::write(self.path_for(id), bytes)
            .await
            .map_err(|e| AppError::Storage(format!("writing blob {}: {}", id, e)))
    }

    async fn get(&self, id: &str) -> Result<Question, AppError> {
        let bytes = fs::read(self.path_for(id)).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AppError::NotFound(format!("Question '{}' not found", id))
            } else {
                AppError::Storage(format!("reading blob {}: {}", id, e))
            }
        })?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Storage(format!("decoding blob {}: {}", id, e)))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| AppError::Storage(format!("listing blob dir: {}", e)))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(format!("listing blob dir: {}", e)))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_suffix(".json") {
                if id.starts_with(prefix) {
                    ids.push(id.to_string());
                }
            }
        }
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
            subject: "AP US History".into(),
            topic: "Unit 4".into(),
            prompt: "Which event preceded the Missouri Compromise?".into(),
            options: QuestionOptions {
                a: "The Louisiana Purchase".into(),
                b: "The Civil War".into(),
                c: "Reconstruction".into(),
                d: "The New Deal".into(),
            },
            correct_option: OptionLabel::A,
            explanation: "The purchase opened the territory question.".into(),
        }
    }

    #[tokio::test]
    async fn round_trips_a_question_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let q = sample_question("q-disk");

        store.put("q-disk", &q).await.unwrap();
        let fetched = store.get("q-disk").await.unwrap();

        assert_eq!(fetched, q);
    }

    #[tokio::test]
    async fn missing_blob_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        let result = store.get("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_strips_extension_and_honors_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        store.put("aaa-1", &sample_question("aaa-1")).await.unwrap();
        store.put("bbb-1", &sample_question("bbb-1")).await.unwrap();

        let all = store.list("").await.unwrap();
        assert_eq!(all, vec!["aaa-1".to_string(), "bbb-1".to_string()]);

        let filtered = store.list("aaa").await.unwrap();
        assert_eq!(filtered, vec!["aaa-1".to_string()]);
    }
}
