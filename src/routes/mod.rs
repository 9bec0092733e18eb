use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod applications;
pub mod auth;
pub mod chat;
pub mod favorites;
pub mod health;
pub mod jobs;
pub mod messages;
pub mod notify;
pub mod users;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    Router::new()
        .route("/", get(health::root))
        .route("/jwt", post(auth::issue_token))
        .route("/user/admin/:email", get(auth::is_admin))
        .route("/user/publisher/:email", get(auth::is_publisher))
        .route("/user/seeker/:email", get(auth::is_seeker))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs-category", get(jobs::jobs_by_category))
        .route("/add-job", post(jobs::add_job))
        .route("/job-details/:id", get(jobs::job_details))
        .route("/update-job/:id", put(jobs::update_job))
        .route("/delete-job/:id", delete(jobs::delete_job))
        .route("/apply-job", post(applications::apply_job))
        .route("/applied-jobs", get(applications::applied_jobs))
        .route(
            "/manage-applications",
            get(applications::manage_applications),
        )
        .route("/live-chats/:id", get(applications::live_chat_context))
        .route(
            "/favorite-jobs",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route("/messages", get(messages::list_messages))
        .route("/send-email", post(notify::notify_seekers))
        .route("/ws", get(chat::ws_upgrade))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
