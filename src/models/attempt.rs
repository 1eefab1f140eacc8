// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{OptionLabel, Question};

/// One recorded answer attempt. Append-only; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Weak reference into the blob store. The question itself is fetched
    /// lazily when history is displayed.
    pub question_id: String,
    pub subject: String,
    pub topic: String,
    pub chosen_option: OptionLabel,
    pub was_correct: bool,
    pub elapsed_ms: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Aggregated mastery statistics for one (user, subject, topic) key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub subject: String,
    pub topic: String,
    pub total_attempts: i64,
    pub correct_attempts: i64,
    /// Rounded percentage of correct attempts, integer in [0, 100].
    pub mastery: i64,
}

/// DTO for recording an attempt. The question_id must come from a prior
/// question fetch; the ledger never generates questions itself.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordAttemptRequest {
    #[validate(length(min = 1, max = 100, message = "question_id is required."))]
    pub question_id: String,
    #[validate(length(min = 1, max = 200, message = "subject is required."))]
    pub subject: String,
    #[validate(length(min = 1, max = 200, message = "topic is required."))]
    pub topic: String,
    #[validate(custom(function = validate_option_letter))]
    pub chosen_option: String,
    pub was_correct: bool,
    #[validate(range(min = 0, message = "elapsed_ms must not be negative."))]
    pub elapsed_ms: i64,
}

fn validate_option_letter(letter: &str) -> Result<(), validator::ValidationError> {
    letter
        .parse::<OptionLabel>()
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("chosen_option_must_be_a_to_d"))
}

/// DTO returned after an attempt is recorded.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordAttemptResponse {
    pub mastery: i64,
    pub total_attempts: i64,
}

/// One history row: the raw attempt plus the question payload, when the blob
/// store still has it.
#[derive(Debug, Serialize)]
pub struct HistoryItem {
    #[serde(flatten)]
    pub attempt: AttemptRecord,
    pub question: Option<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_request_rejects_bad_option_letter() {
        let req = RecordAttemptRequest {
            question_id: "q-1".into(),
            subject: "AP Biology".into(),
            topic: "Unit 1".into(),
            chosen_option: "F".into(),
            was_correct: false,
            elapsed_ms: 1200,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn attempt_request_rejects_missing_fields() {
        let req = RecordAttemptRequest {
            question_id: "".into(),
            subject: "AP Biology".into(),
            topic: "Unit 1".into(),
            chosen_option: "A".into(),
            was_correct: true,
            elapsed_ms: 0,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn attempt_request_accepts_valid_input() {
        let req = RecordAttemptRequest {
            question_id: "q-1".into(),
            subject: "AP Biology".into(),
            topic: "Unit 1".into(),
            chosen_option: "c".into(),
            was_correct: true,
            elapsed_ms: 4500,
        };
        assert!(req.validate().is_ok());
    }
}
