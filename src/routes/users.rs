use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewUser, Role, User},
    state::AppState,
};

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.store.list_users().await?;
    Ok(Json(users))
}

/// First sign-in creates the record; a repeat sign-in with a known email is a
/// soft no-op, not an error. Only the normalized fields are stored, whatever
/// else the client submitted is dropped.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<Value>> {
    if state
        .store
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Ok(Json(json!({
            "message": "User Already Exists",
            "insertedId": null,
        })));
    }

    let user = NewUser {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        role: payload.role,
        photo_url: payload.photo_url,
    };
    let inserted_id = state.store.insert_user(user).await?;

    Ok(Json(json!({
        "acknowledged": true,
        "insertedId": inserted_id,
    })))
}
