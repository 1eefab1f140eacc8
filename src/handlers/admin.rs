// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{error::AppError, state::AppState};

/// DTO naming one concrete cache key.
#[derive(Debug, Deserialize, Validate)]
pub struct CacheKeyRequest {
    #[validate(length(min = 1, max = 200, message = "subject is required."))]
    pub subject: String,
    #[validate(length(min = 1, max = 200, message = "topic must name one concrete unit."))]
    pub topic: String,
}

/// Forces a synchronous generate + persist + populate for the key.
/// Admin only.
pub async fn prime_cache(
    State(state): State<AppState>,
    Json(payload): Json<CacheKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let question = state
        .coordinator
        .prime(payload.subject.trim(), payload.topic.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "question": question }))))
}

/// Drops the cache entry for the key; the next fetch regenerates.
/// Idempotent. Admin only.
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Json(payload): Json<CacheKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    state
        .coordinator
        .invalidate(payload.subject.trim(), payload.topic.trim())
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Cache occupancy, total and per subject. Admin only.
pub async fn cache_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.coordinator.stats().await))
}

#[derive(Debug, Deserialize)]
pub struct ListQuestionsParams {
    pub prefix: Option<String>,
}

/// Enumerates stored question blobs. Not on the request hot path.
/// Admin only.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<ListQuestionsParams>,
) -> Result<impl IntoResponse, AppError> {
    let prefix = params.prefix.unwrap_or_default();
    let ids = state.blobs.list(&prefix).await?;

    Ok(Json(json!({
        "count": ids.len(),
        "ids": ids
    })))
}
