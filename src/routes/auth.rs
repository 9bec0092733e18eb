use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::Role,
    state::AppState,
};

/// `POST /jwt` — signs whatever identity payload the client submits, as long
/// as it carries an email claim. Expiry is fixed; there is no refresh flow.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Value>> {
    let Value::Object(mut identity) = payload else {
        return Err(AppError::bad_request("identity payload must be a JSON object"));
    };

    let email = match identity.remove("email") {
        Some(Value::String(email)) => email,
        _ => return Err(AppError::bad_request("identity payload must contain an email")),
    };

    // Reserved claims are always server-assigned.
    identity.remove("iat");
    identity.remove("exp");

    let token = state.jwt.issue_token(email, identity)?;
    Ok(Json(json!({ "token": token })))
}

pub async fn is_admin(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(email): Path<String>,
) -> AppResult<Json<Value>> {
    let admin = has_role(&state, &user, &email, Role::Admin).await?;
    Ok(Json(json!({ "admin": admin })))
}

pub async fn is_publisher(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(email): Path<String>,
) -> AppResult<Json<Value>> {
    let publisher = has_role(&state, &user, &email, Role::Publisher).await?;
    Ok(Json(json!({ "publisher": publisher })))
}

pub async fn is_seeker(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(email): Path<String>,
) -> AppResult<Json<Value>> {
    let seeker = has_role(&state, &user, &email, Role::Seeker).await?;
    Ok(Json(json!({ "seeker": seeker })))
}

/// A caller may only ask about their own role; the path email must match the
/// token's email claim exactly. An unknown user is simply not that role.
async fn has_role(
    state: &AppState,
    user: &AuthenticatedUser,
    email: &str,
    role: Role,
) -> AppResult<bool> {
    if user.email != email {
        return Err(AppError::forbidden());
    }

    let stored = state.store.find_user_by_email(email).await?;
    Ok(stored.map(|user| user.role == role).unwrap_or(false))
}
