use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chakri::auth::jwt::JwtService;
use chakri::chat::ChatHub;
use chakri::config::AppConfig;
use chakri::mailer::Mailer;
use chakri::models::{
    Application, ChatMessage, FavoriteJob, Job, NewApplication, NewFavoriteJob, NewJob, NewUser,
    Role, User,
};
use chakri::routes;
use chakri::state::AppState;
use chakri::store::{JobFilter, JobStore, StoreResult, UpdateOutcome, DEFAULT_MAX_POOL_SIZE};
use chrono::Utc;
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

/// In-memory stand-in for the Postgres store, one `Vec` per collection.
/// Keeps the same advisory semantics: no uniqueness constraints, duplicate
/// prevention is the caller's read-before-write check.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    jobs: Mutex<Vec<Job>>,
    applications: Mutex<Vec<Application>>,
    favorites: Mutex<Vec<FavoriteJob>>,
    messages: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.lock().await.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<Uuid> {
        let mut users = self.users.lock().await;
        users.push(User {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            photo_url: user.photo_url,
            created_at: Utc::now().naive_utc(),
        });
        Ok(user.id)
    }

    async fn seeker_emails(&self) -> StoreResult<Vec<String>> {
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .filter(|user| user.role == Role::Seeker)
            .map(|user| user.email.clone())
            .collect())
    }

    async fn list_jobs(&self, filter: JobFilter) -> StoreResult<Vec<Job>> {
        let jobs = self.jobs.lock().await;
        let search = filter.search.map(|s| s.to_lowercase());
        Ok(jobs
            .iter()
            .filter(|job| match &search {
                Some(needle) => job.title.to_lowercase().contains(needle),
                None => true,
            })
            .filter(|job| match &filter.category {
                Some(category) => &job.category == category,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let jobs = self.jobs.lock().await;
        Ok(jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn insert_job(&self, job: NewJob) -> StoreResult<Uuid> {
        let mut jobs = self.jobs.lock().await;
        jobs.push(Job {
            id: job.id,
            title: job.title,
            category: job.category,
            description: job.description,
            data: job.data,
            created_at: Utc::now().naive_utc(),
        });
        Ok(job.id)
    }

    async fn update_job(
        &self,
        id: Uuid,
        patch: serde_json::Map<String, Value>,
    ) -> StoreResult<UpdateOutcome> {
        let mut jobs = self.jobs.lock().await;
        let Some(job) = jobs.iter_mut().find(|job| job.id == id) else {
            return Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            });
        };
        let changed = job.apply_patch(patch);
        Ok(UpdateOutcome {
            matched: 1,
            modified: changed as u64,
        })
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<u64> {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|job| job.id != id);
        Ok((before - jobs.len()) as u64)
    }

    async fn insert_application(&self, application: NewApplication) -> StoreResult<Uuid> {
        let mut applications = self.applications.lock().await;
        applications.push(Application {
            id: application.id,
            email: application.email,
            job_id: application.job_id,
            data: application.data,
            created_at: Utc::now().naive_utc(),
        });
        Ok(application.id)
    }

    async fn find_application(
        &self,
        email: &str,
        job_id: &str,
    ) -> StoreResult<Option<Application>> {
        let applications = self.applications.lock().await;
        Ok(applications
            .iter()
            .find(|application| application.email == email && application.job_id == job_id)
            .cloned())
    }

    async fn find_application_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let applications = self.applications.lock().await;
        Ok(applications
            .iter()
            .find(|application| application.id == id)
            .cloned())
    }

    async fn list_applications(&self, email: Option<String>) -> StoreResult<Vec<Application>> {
        let applications = self.applications.lock().await;
        Ok(applications
            .iter()
            .filter(|application| match &email {
                Some(email) => &application.email == email,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn insert_favorite(&self, favorite: NewFavoriteJob) -> StoreResult<Uuid> {
        let mut favorites = self.favorites.lock().await;
        favorites.push(FavoriteJob {
            id: favorite.id,
            email: favorite.email,
            job_id: favorite.job_id,
            data: favorite.data,
            created_at: Utc::now().naive_utc(),
        });
        Ok(favorite.id)
    }

    async fn find_favorite(&self, email: &str, job_id: &str) -> StoreResult<Option<FavoriteJob>> {
        let favorites = self.favorites.lock().await;
        Ok(favorites
            .iter()
            .find(|favorite| favorite.email == email && favorite.job_id == job_id)
            .cloned())
    }

    async fn list_favorites(&self, email: Option<String>) -> StoreResult<Vec<FavoriteJob>> {
        let favorites = self.favorites.lock().await;
        Ok(favorites
            .iter()
            .filter(|favorite| match &email {
                Some(email) => &favorite.email == email,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn insert_message(&self, message: ChatMessage) -> StoreResult<()> {
        let mut messages = self.messages.lock().await;
        messages.push(message);
        Ok(())
    }

    async fn list_messages(&self, applier_email: Option<String>) -> StoreResult<Vec<ChatMessage>> {
        let messages = self.messages.lock().await;
        let mut filtered: Vec<ChatMessage> = messages
            .iter()
            .filter(|message| match &applier_email {
                Some(email) => &message.applier_email == email,
                None => true,
            })
            .cloned()
            .collect();
        filtered.sort_by_key(|message| message.created_at);
        Ok(filtered)
    }
}

#[allow(dead_code)]
#[derive(Clone)]
pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub bcc: Vec<String>,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    #[allow(dead_code)]
    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_bulk(&self, subject: &str, body: &str, bcc: &[String]) -> Result<()> {
        let mut sent = self.sent.lock().await;
        sent.push(SentMail {
            subject: subject.to_string(),
            body: body.to_string(),
            bcc: bcc.to_vec(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig {
            database_url: "postgres://localhost/chakri-test".to_string(),
            database_max_pool_size: DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 5,
            cors_allowed_origin: None,
            smtp_host: "localhost".to_string(),
            smtp_username: "test".to_string(),
            smtp_password: "test".to_string(),
            mail_from: "noreply@chakri.test".to_string(),
        };

        let store = Arc::new(MemoryStore::default());
        let jwt = JwtService::from_config(&config);
        let mailer = Arc::new(RecordingMailer::default());
        let mailer_for_state: Arc<dyn Mailer> = mailer.clone();
        let chat = Arc::new(ChatHub::new());
        let state = AppState::new(store, config, jwt, mailer_for_state, chat);
        let router = routes::create_router(state.clone());

        Self {
            state,
            router,
            mailer,
        }
    }

    #[allow(dead_code)]
    pub fn mailer(&self) -> Arc<RecordingMailer> {
        self.mailer.clone()
    }

    /// Issues a bearer token through `POST /jwt` for the given email.
    #[allow(dead_code)]
    pub async fn issue_token(&self, email: &str) -> Result<String> {
        let response = self
            .post_json("/jwt", &serde_json::json!({ "email": email }), None)
            .await?;
        ensure!(
            response.status() == StatusCode::OK,
            "token issuance failed with status {}",
            response.status()
        );
        let body = body_json(response.into_body()).await?;
        body["token"]
            .as_str()
            .map(|token| token.to_string())
            .ok_or_else(|| anyhow!("token missing from /jwt response"))
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.request_json(Method::POST, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.request_json(Method::PUT, path, payload, token).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(path)
            .body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    async fn request_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

pub async fn body_json(body: Body) -> Result<Value> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(serde_json::from_slice(&collected.to_bytes())?)
}
