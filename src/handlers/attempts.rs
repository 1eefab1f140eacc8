// src/handlers/attempts.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::attempt::{HistoryItem, RecordAttemptRequest},
    models::question::Question,
    state::AppState,
    utils::jwt::Claims,
};

/// Records one answer attempt for the authenticated user.
///
/// The question_id must come from a prior question fetch. Returns the
/// recomputed mastery and attempt total for the (subject, topic) key.
pub async fn record_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RecordAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let outcome = state.ledger.record_attempt(user_id, payload).await?;
    Ok(Json(outcome))
}

/// Returns all progress entries for the authenticated user.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let progress = state.ledger.progress(user_id).await?;
    Ok(Json(progress))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// Recent attempts, newest first, with question payloads hydrated from the
/// blob store where still available.
pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let attempts = state.ledger.history(user_id, limit).await?;

    let ids: Vec<String> = attempts.iter().map(|a| a.question_id.clone()).collect();
    let mut questions: HashMap<String, Question> = state
        .blobs
        .get_many(&ids)
        .await
        .into_iter()
        .map(|q| (q.id.clone(), q))
        .collect();

    let items: Vec<HistoryItem> = attempts
        .into_iter()
        .map(|attempt| {
            let question = questions.remove(&attempt.question_id);
            HistoryItem { attempt, question }
        })
        .collect();

    Ok(Json(items))
}
