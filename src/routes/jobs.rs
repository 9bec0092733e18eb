use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{JobDocument, NewJob},
    state::AppState,
    store::JobFilter,
};

pub const NO_JOBS_MESSAGE: &str = "No jobs found matching your criteria.";

#[derive(Deserialize)]
pub struct JobsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct AddJobRequest {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /jobs` — optional case-insensitive title search and exact category
/// match. An empty result set is reported as a message object rather than an
/// empty array; both shapes come back with status 200.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> AppResult<Json<Value>> {
    let filter = JobFilter {
        search: query.search,
        category: query.category,
    };
    let jobs = state.store.list_jobs(filter).await?;

    if jobs.is_empty() {
        return Ok(Json(json!({ "message": NO_JOBS_MESSAGE })));
    }

    let documents: Vec<JobDocument> = jobs.into_iter().map(|job| job.into_document()).collect();
    Ok(Json(serde_json::to_value(documents)?))
}

pub async fn jobs_by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<Vec<JobDocument>>> {
    let filter = JobFilter {
        search: None,
        category: query.category,
    };
    let jobs = state.store.list_jobs(filter).await?;
    Ok(Json(jobs.into_iter().map(|job| job.into_document()).collect()))
}

pub async fn add_job(
    State(state): State<AppState>,
    Json(payload): Json<AddJobRequest>,
) -> AppResult<Json<Value>> {
    let job = NewJob {
        id: Uuid::new_v4(),
        title: payload.title,
        category: payload.category,
        description: payload.description,
        data: Value::Object(payload.extra),
    };
    let inserted_id = state.store.insert_job(job).await?;

    Ok(Json(json!({
        "acknowledged": true,
        "insertedId": inserted_id,
    })))
}

pub async fn job_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobDocument>> {
    let job = state
        .store
        .find_job(id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(job.into_document()))
}

/// `PUT /update-job/:id` — merges the caller's fields into the job verbatim.
/// There is deliberately no field whitelist and no ownership check.
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Value>> {
    let Value::Object(patch) = payload else {
        return Err(AppError::bad_request("job update must be a JSON object"));
    };

    let outcome = state.store.update_job(id, patch).await?;
    Ok(Json(json!({
        "acknowledged": true,
        "matchedCount": outcome.matched,
        "modifiedCount": outcome.modified,
    })))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let deleted = state.store.delete_job(id).await?;
    Ok(Json(json!({
        "acknowledged": true,
        "deletedCount": deleted,
    })))
}
