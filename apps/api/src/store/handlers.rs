use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::candidate::{CandidateRow, QuestionRatingRow};
use crate::store::ClearedCounts;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<CandidateRow>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }
    Ok(Json(state.store.list_candidates(limit).await?))
}

/// GET /api/v1/candidates/:id/ratings
pub async fn handle_candidate_ratings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<QuestionRatingRow>>, AppError> {
    if state.store.find_candidate(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Candidate {id} not found")));
    }
    Ok(Json(state.store.ratings_for_candidate(id).await?))
}

/// DELETE /api/v1/candidates
/// Operator reset: removes every rating, then every candidate.
pub async fn handle_clear_candidates(
    State(state): State<AppState>,
) -> Result<Json<ClearedCounts>, AppError> {
    Ok(Json(state.store.clear_all().await?))
}
