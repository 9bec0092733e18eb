use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{error::AppResult, state::AppState};

#[derive(Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /send-email` — one mail to every seeker, all addresses in bcc.
/// Send failures are logged and swallowed; the client always sees success.
pub async fn notify_seekers(
    State(state): State<AppState>,
    Json(payload): Json<SendEmailRequest>,
) -> AppResult<Json<Value>> {
    let emails = state.store.seeker_emails().await?;
    let subject = payload
        .subject
        .unwrap_or_else(|| "New opportunities are waiting for you".to_string());
    let body = payload.message.unwrap_or_default();

    if let Err(err) = state.mailer.send_bulk(&subject, &body, &emails).await {
        tracing::error!(error = %err, recipients = emails.len(), "failed to send bulk mail");
    }

    Ok(Json(json!({
        "success": true,
        "message": "Email sent to all seekers.",
    })))
}
