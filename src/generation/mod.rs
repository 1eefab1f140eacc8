// src/generation/mod.rs

pub mod openai;
pub mod profile;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::question::{OptionLabel, QuestionOptions};

pub use openai::OpenAiGenerator;
pub use profile::{Profile, select_profile};

/// A freshly generated question body, before it has been assigned an id and
/// persisted. This is the single structured shape every generator backend
/// must produce; all output validation happens at this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub prompt: String,
    pub options: QuestionOptions,
    pub correct_option: OptionLabel,
    pub explanation: String,
}

impl GeneratedQuestion {
    /// Rejects drafts with blank fields. Option labels and arity are already
    /// guaranteed by the types.
    pub fn validate(&self) -> Result<(), AppError> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.prompt) {
            return Err(AppError::Generation("draft has an empty prompt".into()));
        }
        if blank(&self.options.a)
            || blank(&self.options.b)
            || blank(&self.options.c)
            || blank(&self.options.d)
        {
            return Err(AppError::Generation("draft has an empty option".into()));
        }
        if blank(&self.explanation) {
            return Err(AppError::Generation("draft has an empty explanation".into()));
        }
        Ok(())
    }
}

/// External question generation capability.
///
/// Calls may take seconds and may fail; the coordinator treats every call as
/// fallible, enforces its own timeout, and never holds a lock across it.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, subject: &str, topic: &str) -> Result<GeneratedQuestion, AppError>;
}
