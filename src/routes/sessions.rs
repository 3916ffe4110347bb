use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::extractors::JsonBody;
use crate::kt::types::Topic;
use crate::response::{created, ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/topic", put(select_topic))
        .route("/:id/questions/next", post(next_question))
        .route("/:id/answer", post(submit_answer))
        .route("/:id/observations", post(record_observation))
        .route("/:id/mastery", get(list_mastery))
        .route("/:id/mastery/:topic", get(get_mastery))
        .route("/:id/steps", get(list_steps))
        .route("/:id/log", get(list_session_log))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateSessionRequest {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    topic: Option<Topic>,
}

/// The body is optional; an empty POST starts an unseeded session.
async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice::<CreateSessionRequest>(&body).map_err(|e| {
            tracing::warn!(error = %e, "Invalid create-session body");
            AppError::bad_request("INVALID_REQUEST_BODY", "请求体格式无效")
        })?
    };

    let summary = state.engine().create_session(req.seed, req.topic).await?;
    Ok(created(summary))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().summary(id).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state.engine().remove_session(id).await?;
    Ok(ok(serde_json::json!({ "sessionId": id, "deleted": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectTopicRequest {
    topic: Topic,
}

async fn select_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<SelectTopicRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().select_topic(id, req.topic).await?))
}

async fn next_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().next_question(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest {
    question_id: Uuid,
    selected_index: usize,
}

async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<AnswerRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state
        .engine()
        .answer(id, req.question_id, req.selected_index)
        .await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationRequest {
    topic: Topic,
    is_correct: bool,
}

/// Externally graded answer; updates mastery without a served question.
async fn record_observation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<ObservationRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state
        .engine()
        .observe(id, req.topic, req.is_correct)
        .await?))
}

async fn list_mastery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().mastery_records(id).await?))
}

async fn get_mastery(
    State(state): State<AppState>,
    Path((id, topic)): Path<(Uuid, Topic)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().mastery_record(id, topic).await?))
}

async fn list_steps(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().step_log(id).await?))
}

async fn list_session_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().session_log(id).await?))
}
