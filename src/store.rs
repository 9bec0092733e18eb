use std::time::Duration;

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Application, ChatMessage, FavoriteJob, Job, NewApplication, NewFavoriteJob, NewJob, NewUser,
    Role, User,
};
use crate::schema::{applications, favorite_jobs, jobs, messages, users};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const DEFAULT_MAX_POOL_SIZE: u32 = 2;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("{0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filters for the job listing. Both are optional and applied as a
/// conjunction when present.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Persistence gateway over the five collections. Handlers talk to this
/// trait only; production wires in [`PgStore`], tests an in-memory fake.
#[async_trait]
pub trait JobStore: Send + Sync + 'static {
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: NewUser) -> StoreResult<Uuid>;
    async fn seeker_emails(&self) -> StoreResult<Vec<String>>;

    async fn list_jobs(&self, filter: JobFilter) -> StoreResult<Vec<Job>>;
    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>>;
    async fn insert_job(&self, job: NewJob) -> StoreResult<Uuid>;
    async fn update_job(&self, id: Uuid, patch: Map<String, Value>) -> StoreResult<UpdateOutcome>;
    async fn delete_job(&self, id: Uuid) -> StoreResult<u64>;

    async fn insert_application(&self, application: NewApplication) -> StoreResult<Uuid>;
    async fn find_application(&self, email: &str, job_id: &str)
        -> StoreResult<Option<Application>>;
    async fn find_application_by_id(&self, id: Uuid) -> StoreResult<Option<Application>>;
    async fn list_applications(&self, email: Option<String>) -> StoreResult<Vec<Application>>;

    async fn insert_favorite(&self, favorite: NewFavoriteJob) -> StoreResult<Uuid>;
    async fn find_favorite(&self, email: &str, job_id: &str) -> StoreResult<Option<FavoriteJob>>;
    async fn list_favorites(&self, email: Option<String>) -> StoreResult<Vec<FavoriteJob>>;

    async fn insert_message(&self, message: ChatMessage) -> StoreResult<()>;
    async fn list_messages(&self, applier_email: Option<String>) -> StoreResult<Vec<ChatMessage>>;
}

/// Diesel-backed store. The pool is opened once at startup and shared; every
/// query runs on the blocking pool so handlers only suspend at I/O.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn connect(database_url: &str, max_size: u32) -> anyhow::Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .connection_timeout(Duration::from_secs(10))
            .build(manager)?;
        Ok(Self { pool })
    }

    pub fn run_migrations(&self) -> anyhow::Result<()> {
        let mut conn = self.pool.get()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow::anyhow!("failed to run migrations: {err}"))?;
        Ok(())
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| StoreError::Other(format!("connection pool error: {err}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Other(format!("database task panicked: {err}")))?
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.with_conn(|conn| {
            let rows = users::table
                .order(users::created_at.asc())
                .load::<User>(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            let row = users::table
                .filter(users::email.eq(&email))
                .first::<User>(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<Uuid> {
        self.with_conn(move |conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .execute(conn)?;
            Ok(user.id)
        })
        .await
    }

    async fn seeker_emails(&self) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let emails = users::table
                .filter(users::role.eq(Role::Seeker))
                .select(users::email)
                .load::<String>(conn)?;
            Ok(emails)
        })
        .await
    }

    async fn list_jobs(&self, filter: JobFilter) -> StoreResult<Vec<Job>> {
        self.with_conn(move |conn| {
            let mut query = jobs::table.order(jobs::created_at.desc()).into_boxed();
            if let Some(search) = filter.search {
                query = query.filter(jobs::title.ilike(format!("%{}%", search)));
            }
            if let Some(category) = filter.category {
                query = query.filter(jobs::category.eq(category));
            }
            let rows = query.load::<Job>(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        self.with_conn(move |conn| {
            let row = jobs::table.find(id).first::<Job>(conn).optional()?;
            Ok(row)
        })
        .await
    }

    async fn insert_job(&self, job: NewJob) -> StoreResult<Uuid> {
        self.with_conn(move |conn| {
            diesel::insert_into(jobs::table).values(&job).execute(conn)?;
            Ok(job.id)
        })
        .await
    }

    async fn update_job(&self, id: Uuid, patch: Map<String, Value>) -> StoreResult<UpdateOutcome> {
        self.with_conn(move |conn| {
            let existing = jobs::table.find(id).first::<Job>(conn).optional()?;
            let Some(mut job) = existing else {
                return Ok(UpdateOutcome {
                    matched: 0,
                    modified: 0,
                });
            };

            let changed = job.apply_patch(patch);
            if changed {
                diesel::update(jobs::table.find(id))
                    .set((
                        jobs::title.eq(job.title),
                        jobs::category.eq(job.category),
                        jobs::description.eq(job.description),
                        jobs::data.eq(job.data),
                    ))
                    .execute(conn)?;
            }

            Ok(UpdateOutcome {
                matched: 1,
                modified: changed as u64,
            })
        })
        .await
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<u64> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(jobs::table.find(id)).execute(conn)?;
            Ok(deleted as u64)
        })
        .await
    }

    async fn insert_application(&self, application: NewApplication) -> StoreResult<Uuid> {
        self.with_conn(move |conn| {
            diesel::insert_into(applications::table)
                .values(&application)
                .execute(conn)?;
            Ok(application.id)
        })
        .await
    }

    async fn find_application(
        &self,
        email: &str,
        job_id: &str,
    ) -> StoreResult<Option<Application>> {
        let email = email.to_string();
        let job_id = job_id.to_string();
        self.with_conn(move |conn| {
            let row = applications::table
                .filter(applications::email.eq(&email))
                .filter(applications::job_id.eq(&job_id))
                .first::<Application>(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn find_application_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        self.with_conn(move |conn| {
            let row = applications::table
                .find(id)
                .first::<Application>(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn list_applications(&self, email: Option<String>) -> StoreResult<Vec<Application>> {
        self.with_conn(move |conn| {
            let mut query = applications::table
                .order(applications::created_at.asc())
                .into_boxed();
            if let Some(email) = email {
                query = query.filter(applications::email.eq(email));
            }
            let rows = query.load::<Application>(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn insert_favorite(&self, favorite: NewFavoriteJob) -> StoreResult<Uuid> {
        self.with_conn(move |conn| {
            diesel::insert_into(favorite_jobs::table)
                .values(&favorite)
                .execute(conn)?;
            Ok(favorite.id)
        })
        .await
    }

    async fn find_favorite(&self, email: &str, job_id: &str) -> StoreResult<Option<FavoriteJob>> {
        let email = email.to_string();
        let job_id = job_id.to_string();
        self.with_conn(move |conn| {
            let row = favorite_jobs::table
                .filter(favorite_jobs::email.eq(&email))
                .filter(favorite_jobs::job_id.eq(&job_id))
                .first::<FavoriteJob>(conn)
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn list_favorites(&self, email: Option<String>) -> StoreResult<Vec<FavoriteJob>> {
        self.with_conn(move |conn| {
            let mut query = favorite_jobs::table
                .order(favorite_jobs::created_at.asc())
                .into_boxed();
            if let Some(email) = email {
                query = query.filter(favorite_jobs::email.eq(email));
            }
            let rows = query.load::<FavoriteJob>(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn insert_message(&self, message: ChatMessage) -> StoreResult<()> {
        self.with_conn(move |conn| {
            diesel::insert_into(messages::table)
                .values(&message)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn list_messages(&self, applier_email: Option<String>) -> StoreResult<Vec<ChatMessage>> {
        self.with_conn(move |conn| {
            let mut query = messages::table
                .order(messages::created_at.asc())
                .into_boxed();
            if let Some(applier_email) = applier_email {
                query = query.filter(messages::applier_email.eq(applier_email));
            }
            let rows = query.load::<ChatMessage>(conn)?;
            Ok(rows)
        })
        .await
    }
}
