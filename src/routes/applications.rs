use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ApplicationDocument, NewApplication},
    state::AppState,
};

pub const ALREADY_APPLIED_MESSAGE: &str = "Already applied for the job.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyJobRequest {
    pub email: String,
    pub job_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// `POST /apply-job` — at most one application per (email, jobId). The check
/// and the insert are separate reads, so two concurrent submissions for the
/// same pair can both slip through; serialized submissions cannot.
pub async fn apply_job(
    State(state): State<AppState>,
    Json(payload): Json<ApplyJobRequest>,
) -> AppResult<Json<Value>> {
    if state
        .store
        .find_application(&payload.email, &payload.job_id)
        .await?
        .is_some()
    {
        return Ok(Json(json!({ "message": ALREADY_APPLIED_MESSAGE })));
    }

    let application = NewApplication {
        id: Uuid::new_v4(),
        email: payload.email,
        job_id: payload.job_id,
        data: Value::Object(payload.extra),
    };
    let inserted_id = state.store.insert_application(application).await?;

    Ok(Json(json!({
        "acknowledged": true,
        "insertedId": inserted_id,
    })))
}

pub async fn applied_jobs(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> AppResult<Json<Vec<ApplicationDocument>>> {
    let applications = state.store.list_applications(query.email).await?;
    Ok(Json(
        applications
            .into_iter()
            .map(|application| application.into_document())
            .collect(),
    ))
}

pub async fn manage_applications(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ApplicationDocument>>> {
    let applications = state.store.list_applications(None).await?;
    Ok(Json(
        applications
            .into_iter()
            .map(|application| application.into_document())
            .collect(),
    ))
}

/// `GET /live-chats/:id` — the application record a chat is anchored to.
pub async fn live_chat_context(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApplicationDocument>> {
    let application = state
        .store
        .find_application_by_id(id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(application.into_document()))
}
