use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Validated personal details collected during the info phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// Years of experience, always >= 0.
    pub experience: f64,
    pub position: String,
    pub location: String,
}

/// A candidate ready to be committed, with the stacks screened this session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCandidate {
    pub info: CandidateInfo,
    pub tech_stacks: Vec<String>,
}

/// One rating row to be written for a committed candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuestionRating {
    pub tech_stack: String,
    pub question: String,
    pub stars: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub experience: i64,
    pub position: String,
    pub location: String,
    /// JSON array of stack names.
    pub tech_stacks: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionRatingRow {
    pub id: i64,
    pub candidate_id: i64,
    pub tech_stack: String,
    pub question: String,
    pub stars: i64,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}
