// src/handlers/questions.rs

use axum::{Json, extract::{Query, State}, response::IntoResponse};
use rand::Rng;
use serde::Deserialize;

use crate::{
    error::AppError,
    models::question::FetchQuestionResponse,
    state::AppState,
};

/// Number of units assumed for subjects missing from the catalog.
const DEFAULT_UNIT_COUNT: u32 = 9;

/// Unit counts for the courses the frontend currently offers.
const UNIT_CATALOG: &[(&str, u32)] = &[
    ("AP Biology", 8),
    ("AP Chemistry", 9),
    ("AP Physics C", 7),
    ("AP Environmental Science", 9),
    ("AP Calculus AB", 8),
    ("AP Calculus BC", 10),
    ("AP Statistics", 9),
    ("AP Computer Science A", 10),
    ("AP US History", 9),
    ("AP World History", 9),
    ("AP Psychology", 5),
    ("AP Human Geography", 7),
    ("AP English Literature", 9),
    ("AP Macroeconomics", 6),
    ("AP Microeconomics", 6),
    ("AP US Government", 5),
];

fn unit_count(subject: &str) -> u32 {
    UNIT_CATALOG
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(subject))
        .map(|(_, count)| *count)
        .unwrap_or(DEFAULT_UNIT_COUNT)
}

/// Query parameters for a question fetch.
///
/// `topic` names one concrete unit. When absent, one unit is drawn uniformly
/// from the whole subject; when `unit_start`/`unit_end` are given instead,
/// from that range. The cache only ever sees the resolved unit, so repeated
/// "any unit" requests spread entries across the subject's units.
#[derive(Debug, Deserialize)]
pub struct FetchQuestionParams {
    pub subject: String,
    pub topic: Option<String>,
    pub unit_start: Option<u32>,
    pub unit_end: Option<u32>,
    #[serde(default)]
    pub fresh: bool,
}

/// Resolves the topic sentinel to one concrete unit.
fn resolve_topic(params: &FetchQuestionParams) -> Result<String, AppError> {
    if let Some(topic) = params.topic.as_deref() {
        if !topic.trim().is_empty() {
            return Ok(topic.trim().to_string());
        }
    }

    let max_unit = unit_count(&params.subject);
    let (start, end) = match (params.unit_start, params.unit_end) {
        (Some(start), Some(end)) => {
            if start < 1 || end < start || end > max_unit {
                return Err(AppError::Validation(format!(
                    "Unit range {}..{} is not valid for {} (1..{})",
                    start, end, params.subject, max_unit
                )));
            }
            (start, end)
        }
        (None, None) => (1, max_unit),
        _ => {
            return Err(AppError::Validation(
                "unit_start and unit_end must be given together".to_string(),
            ));
        }
    };

    let unit = rand::rng().random_range(start..=end);
    Ok(format!("Unit {}", unit))
}

/// Serves a question for the requested subject and unit.
///
/// Warm hits return instantly while a replacement is generated in the
/// background; cold misses and `fresh=true` requests wait on generation.
pub async fn get_question(
    State(state): State<AppState>,
    Query(params): Query<FetchQuestionParams>,
) -> Result<impl IntoResponse, AppError> {
    if params.subject.trim().is_empty() {
        return Err(AppError::Validation("subject is required".to_string()));
    }

    let topic = resolve_topic(&params)?;

    let (question, served_from_cache) = state
        .coordinator
        .fetch(params.subject.trim(), &topic, params.fresh)
        .await?;

    Ok(Json(FetchQuestionResponse {
        question,
        served_from_cache,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(topic: Option<&str>, range: Option<(u32, u32)>) -> FetchQuestionParams {
        FetchQuestionParams {
            subject: "AP Biology".into(),
            topic: topic.map(str::to_string),
            unit_start: range.map(|(s, _)| s),
            unit_end: range.map(|(_, e)| e),
            fresh: false,
        }
    }

    #[test]
    fn explicit_topic_passes_through_unchanged() {
        let resolved = resolve_topic(&params(Some("Unit 4"), None)).unwrap();
        assert_eq!(resolved, "Unit 4");
    }

    #[test]
    fn blank_topic_falls_back_to_the_whole_subject() {
        for _ in 0..50 {
            let resolved = resolve_topic(&params(Some("   "), None)).unwrap();
            let n: u32 = resolved.strip_prefix("Unit ").unwrap().parse().unwrap();
            assert!((1..=8).contains(&n), "{} out of range", resolved);
        }
    }

    #[test]
    fn range_sentinel_stays_within_bounds() {
        for _ in 0..50 {
            let resolved = resolve_topic(&params(None, Some((2, 4)))).unwrap();
            let n: u32 = resolved.strip_prefix("Unit ").unwrap().parse().unwrap();
            assert!((2..=4).contains(&n), "{} out of range", resolved);
        }
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(resolve_topic(&params(None, Some((0, 3)))).is_err());
        assert!(resolve_topic(&params(None, Some((5, 2)))).is_err());
        assert!(resolve_topic(&params(None, Some((1, 99)))).is_err());

        let mut half_open = params(None, None);
        half_open.unit_start = Some(2);
        assert!(resolve_topic(&half_open).is_err());
    }

    #[test]
    fn unknown_subjects_use_the_default_unit_count() {
        assert_eq!(unit_count("Underwater Basket Weaving"), DEFAULT_UNIT_COUNT);
        assert_eq!(unit_count("AP Psychology"), 5);
        assert_eq!(unit_count("ap psychology"), 5);
    }
}
