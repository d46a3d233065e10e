//! Persistence Gateway — durable candidate and rating rows.
//!
//! Default: `SqliteCandidateStore`. `AppState` holds an `Arc<dyn CandidateStore>`
//! so the screening controller can be exercised against an in-memory fake.

pub mod handlers;
pub mod sqlite;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::candidate::{CandidateRow, NewCandidate, NewQuestionRating, QuestionRatingRow};

pub use sqlite::SqliteCandidateStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not encode stack list: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of inserting a candidate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "candidate_id", rename_all = "snake_case")]
pub enum InsertOutcome {
    Inserted(i64),
    /// The email is already registered; nothing was written.
    DuplicateEmail,
}

/// Result of committing a finished screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed { candidate_id: i64, ratings: usize },
    DuplicateEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearedCounts {
    pub ratings: u64,
    pub candidates: u64,
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Idempotently creates both tables. Safe to call on every startup.
    async fn init_schema(&self) -> Result<(), StoreError>;

    /// Inserts one candidate. A taken email yields `DuplicateEmail`, not an error.
    async fn insert_candidate(&self, candidate: &NewCandidate) -> Result<InsertOutcome, StoreError>;

    /// Inserts one rating row. Failures are logged and reported as `false`.
    async fn insert_question_rating(&self, candidate_id: i64, rating: &NewQuestionRating) -> bool;

    /// Writes the candidate and all ratings in one transaction.
    async fn commit_screening(
        &self,
        candidate: &NewCandidate,
        ratings: &[NewQuestionRating],
    ) -> Result<CommitOutcome, StoreError>;

    async fn list_candidates(&self, limit: i64) -> Result<Vec<CandidateRow>, StoreError>;

    async fn find_candidate(&self, candidate_id: i64) -> Result<Option<CandidateRow>, StoreError>;

    async fn ratings_for_candidate(
        &self,
        candidate_id: i64,
    ) -> Result<Vec<QuestionRatingRow>, StoreError>;

    /// Deletes every rating, then every candidate.
    async fn clear_all(&self) -> Result<ClearedCounts, StoreError>;
}
