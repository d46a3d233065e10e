use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteQueryResult;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{error, info, warn};

use crate::models::candidate::{CandidateRow, NewCandidate, NewQuestionRating, QuestionRatingRow};
use crate::store::{CandidateStore, ClearedCounts, CommitOutcome, InsertOutcome, StoreError};

const CREATE_CANDIDATES: &str = r#"
    CREATE TABLE IF NOT EXISTS candidates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT NOT NULL,
        experience INTEGER NOT NULL,
        position TEXT NOT NULL,
        location TEXT NOT NULL,
        tech_stacks TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL
    )
"#;

const CREATE_QUESTION_RATINGS: &str = r#"
    CREATE TABLE IF NOT EXISTS question_ratings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        candidate_id INTEGER NOT NULL REFERENCES candidates(id),
        tech_stack TEXT NOT NULL,
        question TEXT NOT NULL,
        stars INTEGER NOT NULL,
        feedback TEXT,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_RATINGS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_question_ratings_candidate ON question_ratings(candidate_id)";

/// SQLite-backed candidate store. Each operation borrows a pooled connection
/// for its own duration only.
#[derive(Clone)]
pub struct SqliteCandidateStore {
    pool: SqlitePool,
}

impl SqliteCandidateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_candidate_row<'e, E>(
    executor: E,
    candidate: &NewCandidate,
) -> Result<SqliteQueryResult, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let info = &candidate.info;
    let tech_stacks = serde_json::to_string(&candidate.tech_stacks)?;
    Ok(sqlx::query(
        r#"
        INSERT INTO candidates
            (full_name, email, phone, experience, position, location, tech_stacks, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&info.full_name)
    .bind(&info.email)
    .bind(&info.phone)
    // Stored as whole years.
    .bind(info.experience.trunc() as i64)
    .bind(&info.position)
    .bind(&info.location)
    .bind(tech_stacks)
    .bind(Utc::now())
    .execute(executor)
    .await?)
}

async fn insert_rating_row<'e, E>(
    executor: E,
    candidate_id: i64,
    rating: &NewQuestionRating,
) -> Result<SqliteQueryResult, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO question_ratings
            (candidate_id, tech_stack, question, stars, feedback, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(candidate_id)
    .bind(&rating.tech_stack)
    .bind(&rating.question)
    .bind(i64::from(rating.stars))
    .bind(&rating.feedback)
    .bind(Utc::now())
    .execute(executor)
    .await
}

fn is_duplicate_email(err: &StoreError) -> bool {
    match err {
        StoreError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl CandidateStore for SqliteCandidateStore {
    async fn init_schema(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for statement in [CREATE_CANDIDATES, CREATE_QUESTION_RATINGS, CREATE_RATINGS_INDEX] {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Database schema ready");
        Ok(())
    }

    async fn insert_candidate(&self, candidate: &NewCandidate) -> Result<InsertOutcome, StoreError> {
        match insert_candidate_row(&self.pool, candidate).await {
            Ok(result) => {
                let id = result.last_insert_rowid();
                info!("Inserted candidate {id}");
                Ok(InsertOutcome::Inserted(id))
            }
            Err(e) if is_duplicate_email(&e) => {
                warn!("Candidate email {} is already registered", candidate.info.email);
                Ok(InsertOutcome::DuplicateEmail)
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_question_rating(&self, candidate_id: i64, rating: &NewQuestionRating) -> bool {
        match insert_rating_row(&self.pool, candidate_id, rating).await {
            Ok(_) => true,
            Err(e) => {
                error!("Error inserting rating for candidate {candidate_id}: {e}");
                false
            }
        }
    }

    async fn commit_screening(
        &self,
        candidate: &NewCandidate,
        ratings: &[NewQuestionRating],
    ) -> Result<CommitOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let candidate_id = match insert_candidate_row(&mut *tx, candidate).await {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_duplicate_email(&e) => {
                tx.rollback().await?;
                warn!("Candidate email {} is already registered", candidate.info.email);
                return Ok(CommitOutcome::DuplicateEmail);
            }
            Err(e) => return Err(e),
        };

        for rating in ratings {
            insert_rating_row(&mut *tx, candidate_id, rating).await?;
        }

        tx.commit().await?;
        info!(
            "Committed candidate {candidate_id} with {} question ratings",
            ratings.len()
        );

        Ok(CommitOutcome::Committed {
            candidate_id,
            ratings: ratings.len(),
        })
    }

    async fn list_candidates(&self, limit: i64) -> Result<Vec<CandidateRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates ORDER BY id LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_candidate(&self, candidate_id: i64) -> Result<Option<CandidateRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = ?")
                .bind(candidate_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn ratings_for_candidate(
        &self,
        candidate_id: i64,
    ) -> Result<Vec<QuestionRatingRow>, StoreError> {
        Ok(sqlx::query_as::<_, QuestionRatingRow>(
            "SELECT * FROM question_ratings WHERE candidate_id = ? ORDER BY id",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn clear_all(&self) -> Result<ClearedCounts, StoreError> {
        let mut tx = self.pool.begin().await?;
        // Ratings first: they reference candidates.
        let ratings = sqlx::query("DELETE FROM question_ratings")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let candidates = sqlx::query("DELETE FROM candidates")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        info!("Cleared {candidates} candidates and {ratings} question ratings");
        Ok(ClearedCounts {
            ratings,
            candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use crate::models::candidate::CandidateInfo;

    async fn memory_store() -> SqliteCandidateStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let store = SqliteCandidateStore::new(pool);
        store.init_schema().await.unwrap();
        store
    }

    fn jane(email: &str) -> NewCandidate {
        NewCandidate {
            info: CandidateInfo {
                full_name: "Jane Doe".to_string(),
                email: email.to_string(),
                phone: "9876543210".to_string(),
                experience: 3.5,
                position: "Backend Engineer".to_string(),
                location: "Pune".to_string(),
            },
            tech_stacks: vec!["Python".to_string(), "Flask".to_string()],
        }
    }

    fn rating(stack: &str, stars: u8) -> NewQuestionRating {
        NewQuestionRating {
            tech_stack: stack.to_string(),
            question: format!("What is {stack}?"),
            stars,
            feedback: "Solid".to_string(),
        }
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let store = memory_store().await;
        store.init_schema().await.unwrap();
        store.init_schema().await.unwrap();
        assert!(store.list_candidates(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_schema_survives_reopen_of_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("screening.db").display());

        let first = SqliteCandidateStore::new(create_pool(&url).await.unwrap());
        first.init_schema().await.unwrap();
        first.insert_candidate(&jane("jane@x.com")).await.unwrap();

        let second = SqliteCandidateStore::new(create_pool(&url).await.unwrap());
        second.init_schema().await.unwrap();
        assert_eq!(second.list_candidates(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_returns_no_identifier() {
        let store = memory_store().await;
        let first = store.insert_candidate(&jane("jane@x.com")).await.unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(_)));

        let second = store.insert_candidate(&jane("jane@x.com")).await.unwrap();
        assert_eq!(second, InsertOutcome::DuplicateEmail);
        assert_eq!(store.list_candidates(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_candidate_row_round_trips() {
        let store = memory_store().await;
        store.insert_candidate(&jane("jane@x.com")).await.unwrap();

        let rows = store.list_candidates(5).await.unwrap();
        assert_eq!(rows[0].email, "jane@x.com");
        assert_eq!(rows[0].experience, 3);
        assert_eq!(rows[0].tech_stacks, r#"["Python","Flask"]"#);

        let found = store.find_candidate(rows[0].id).await.unwrap().unwrap();
        assert_eq!(found.full_name, "Jane Doe");
        assert!(store.find_candidate(rows[0].id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rating_requires_existing_candidate() {
        let store = memory_store().await;
        assert!(!store.insert_question_rating(42, &rating("Python", 2)).await);

        let InsertOutcome::Inserted(id) = store.insert_candidate(&jane("jane@x.com")).await.unwrap()
        else {
            panic!("candidate not inserted");
        };
        assert!(store.insert_question_rating(id, &rating("Python", 2)).await);
        let ratings = store.ratings_for_candidate(id).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].stars, 2);
    }

    #[tokio::test]
    async fn test_commit_screening_writes_everything() {
        let store = memory_store().await;
        let ratings = vec![rating("Python", 3), rating("Python", 1), rating("Flask", 0)];

        let outcome = store
            .commit_screening(&jane("jane@x.com"), &ratings)
            .await
            .unwrap();
        let CommitOutcome::Committed {
            candidate_id,
            ratings: written,
        } = outcome
        else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!(written, 3);
        assert_eq!(store.ratings_for_candidate(candidate_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_commit_screening_duplicate_writes_nothing() {
        let store = memory_store().await;
        store.insert_candidate(&jane("jane@x.com")).await.unwrap();

        let outcome = store
            .commit_screening(&jane("jane@x.com"), &[rating("Python", 2)])
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::DuplicateEmail);

        let cleared = store.clear_all().await.unwrap();
        assert_eq!(
            cleared,
            ClearedCounts {
                ratings: 0,
                candidates: 1
            }
        );
    }
}
