use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{error::AppResult, models::ChatMessage, state::AppState};

#[derive(Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "applierEmail")]
    pub applier_email: Option<String>,
}

/// `GET /messages` — chat history, ascending by creation time. This is the
/// backfill path for subscribers who connected after a broadcast.
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<Vec<ChatMessage>>> {
    let messages = state.store.list_messages(query.applier_email).await?;
    Ok(Json(messages))
}
