use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::controller::Turn;
use crate::screening::registry::SharedSession;
use crate::screening::session::SessionView;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TextInput {
    pub text: String,
}

#[derive(Deserialize)]
pub struct AnswerUpdate {
    /// Zero-based question index to answer text.
    pub answers: BTreeMap<usize, String>,
}

#[derive(Serialize)]
pub struct TurnResponse {
    #[serde(flatten)]
    pub turn: Turn,
    pub session: SessionView,
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create().await;
    let view = session.lock().await.view();
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// POST /api/v1/sessions/:id/messages
pub async fn handle_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TextInput>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.submit_message(&mut session, &req.text).await?;
    Ok(Json(TurnResponse {
        turn,
        session: session.view(),
    }))
}

/// PUT /api/v1/sessions/:id/answers
pub async fn handle_update_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerUpdate>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.update_answers(&mut session, &req.answers)?;
    Ok(Json(TurnResponse {
        turn,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/answers/submit
pub async fn handle_submit_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.submit_answers(&mut session).await?;
    Ok(Json(TurnResponse {
        turn,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/questions/retry
pub async fn handle_retry_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.retry_questions(&mut session).await?;
    Ok(Json(TurnResponse {
        turn,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/stacks
pub async fn handle_add_stacks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TextInput>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.add_stacks(&mut session, &req.text).await?;
    Ok(Json(TurnResponse {
        turn,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/stacks/skip
pub async fn handle_skip_stack(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.skip_stack(&mut session).await?;
    Ok(Json(TurnResponse {
        turn,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/next
pub async fn handle_next_stack(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.next_stack(&mut session).await?;
    Ok(Json(TurnResponse {
        turn,
        session: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/finish
/// The session is dropped from the registry once it has finished.
pub async fn handle_finish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;
    let turn = state.controller.finish(&mut session).await?;
    let view = session.view();
    drop(session);
    // A finished session accepts no further actions.
    state.sessions.remove(id).await;
    Ok(Json(TurnResponse {
        turn,
        session: view,
    }))
}
