// src/generation/openai.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::AppError;
use crate::generation::{GeneratedQuestion, Profile, QuestionGenerator, select_profile};

/// Generator backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_humanities: String,
    model_quantitative: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiGenerator {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        // The client timeout is a transport-level backstop; the coordinator
        // enforces its own deadline around the whole call.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.generation_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("building http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.generation_base_url.trim_end_matches('/').to_string(),
            api_key: config.generation_api_key.clone(),
            model_humanities: config.model_humanities.clone(),
            model_quantitative: config.model_quantitative.clone(),
        })
    }

    fn model_for(&self, subject: &str) -> &str {
        match select_profile(subject) {
            Profile::Humanities => &self.model_humanities,
            Profile::Quantitative => &self.model_quantitative,
        }
    }
}

/// Parses the model's reply into a validated draft.
///
/// The provider is instructed to answer with a bare JSON object; anything
/// else (prose, markdown fences, missing fields) is a generation failure.
fn parse_draft(content: &str) -> Result<GeneratedQuestion, AppError> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let draft: GeneratedQuestion = serde_json::from_str(trimmed)
        .map_err(|e| AppError::Generation(format!("malformed generator output: {}", e)))?;

    draft.validate()?;
    Ok(draft)
}

#[async_trait]
impl QuestionGenerator for OpenAiGenerator {
    async fn generate(&self, subject: &str, topic: &str) -> Result<GeneratedQuestion, AppError> {
        let model = self.model_for(subject);

        let body = json!({
            "model": model,
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": "You write one multiple-choice practice question at a time. \
                                Respond with a single JSON object with keys: prompt (string), \
                                options (object with string keys a, b, c, d), \
                                correct_option (one of \"A\", \"B\", \"C\", \"D\"), \
                                explanation (string). No other text."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Write a challenging practice question for the course \"{}\", covering \"{}\".",
                        subject, topic
                    )
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Generation(format!("provider timed out: {}", e))
                } else {
                    AppError::Generation(format!("provider request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "provider returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("undecodable provider reply: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AppError::Generation("provider reply had no choices".into()))?;

        parse_draft(content)
    }
}
