pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::screening::handlers as sessions;
use crate::state::AppState;
use crate::store::handlers as candidates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screening sessions
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/messages",
            post(sessions::handle_message),
        )
        .route(
            "/api/v1/sessions/:id/answers",
            put(sessions::handle_update_answers),
        )
        .route(
            "/api/v1/sessions/:id/answers/submit",
            post(sessions::handle_submit_answers),
        )
        .route(
            "/api/v1/sessions/:id/questions/retry",
            post(sessions::handle_retry_questions),
        )
        .route(
            "/api/v1/sessions/:id/stacks",
            post(sessions::handle_add_stacks),
        )
        .route(
            "/api/v1/sessions/:id/stacks/skip",
            post(sessions::handle_skip_stack),
        )
        .route("/api/v1/sessions/:id/next", post(sessions::handle_next_stack))
        .route("/api/v1/sessions/:id/finish", post(sessions::handle_finish))
        // Committed candidates
        .route(
            "/api/v1/candidates",
            get(candidates::handle_list_candidates).delete(candidates::handle_clear_candidates),
        )
        .route(
            "/api/v1/candidates/:id/ratings",
            get(candidates::handle_candidate_ratings),
        )
        .with_state(state)
}
