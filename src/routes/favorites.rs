use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ApplicationDocument, NewFavoriteJob},
    state::AppState,
};

pub const ALREADY_FAVORITE_MESSAGE: &str = "Job already added to favorites.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub email: String,
    pub job_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Same advisory duplicate rule as applications: one favorite per
/// (email, jobId), enforced by a read before the write.
pub async fn add_favorite(
    State(state): State<AppState>,
    Json(payload): Json<AddFavoriteRequest>,
) -> AppResult<Json<Value>> {
    if state
        .store
        .find_favorite(&payload.email, &payload.job_id)
        .await?
        .is_some()
    {
        return Ok(Json(json!({ "message": ALREADY_FAVORITE_MESSAGE })));
    }

    let favorite = NewFavoriteJob {
        id: Uuid::new_v4(),
        email: payload.email,
        job_id: payload.job_id,
        data: Value::Object(payload.extra),
    };
    let inserted_id = state.store.insert_favorite(favorite).await?;

    Ok(Json(json!({
        "acknowledged": true,
        "insertedId": inserted_id,
    })))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> AppResult<Json<Vec<ApplicationDocument>>> {
    let favorites = state.store.list_favorites(query.email).await?;
    Ok(Json(
        favorites
            .into_iter()
            .map(|favorite| favorite.into_document())
            .collect(),
    ))
}
