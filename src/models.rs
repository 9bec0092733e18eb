use std::fmt;
use std::io::Write;

use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::*;

/// The three roles a user can hold. Stored as plain text in the users table
/// but closed at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Publisher,
    Seeker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Publisher => "publisher",
            Role::Seeker => "seeker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Pg> for Role {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Role {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        match value.as_bytes() {
            b"admin" => Ok(Role::Admin),
            b"publisher" => Ok(Role::Publisher),
            b"seeker" => Ok(Role::Seeker),
            other => Err(format!("unknown role: {}", String::from_utf8_lossy(other)).into()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = jobs)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub data: Value,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = applications)]
pub struct Application {
    pub id: Uuid,
    pub email: String,
    pub job_id: String,
    pub data: Value,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = applications)]
pub struct NewApplication {
    pub id: Uuid,
    pub email: String,
    pub job_id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = favorite_jobs)]
pub struct FavoriteJob {
    pub id: Uuid,
    pub email: String,
    pub job_id: String,
    pub data: Value,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorite_jobs)]
pub struct NewFavoriteJob {
    pub id: Uuid,
    pub email: String,
    pub job_id: String,
    pub data: Value,
}

/// A chat message is written exactly once with a server-assigned timestamp,
/// so the same struct serves as insert row, query row, and broadcast payload.
#[derive(Debug, Clone, Queryable, Identifiable, Insertable, Serialize)]
#[diesel(table_name = messages)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub applier_email: String,
    pub sender_email: String,
    pub sender: String,
    pub created_at: NaiveDateTime,
}

/// Wire shape for a job: the typed columns plus whatever extra fields the
/// publisher originally submitted, flattened back to the top level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDocument {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDocument {
    pub id: Uuid,
    pub email: String,
    pub job_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub created_at: NaiveDateTime,
}

impl Job {
    /// Merges caller-supplied fields into the job, mirroring a document-store
    /// update: known string fields move into their typed columns, everything
    /// else is written verbatim into the free-form data object. Returns true
    /// when any field actually changed.
    pub fn apply_patch(&mut self, patch: Map<String, Value>) -> bool {
        let mut data = into_object(self.data.take());
        let mut changed = false;

        for (key, value) in patch {
            match (key.as_str(), value) {
                ("id", _) | ("createdAt", _) => {}
                ("title", Value::String(title)) => {
                    if title != self.title {
                        self.title = title;
                        changed = true;
                    }
                }
                ("category", Value::String(category)) => {
                    if category != self.category {
                        self.category = category;
                        changed = true;
                    }
                }
                ("description", Value::Null) => {
                    if self.description.is_some() {
                        self.description = None;
                        changed = true;
                    }
                }
                ("description", Value::String(description)) => {
                    if self.description.as_deref() != Some(description.as_str()) {
                        self.description = Some(description);
                        changed = true;
                    }
                }
                (_, value) => {
                    if data.get(&key) != Some(&value) {
                        data.insert(key, value);
                        changed = true;
                    }
                }
            }
        }

        self.data = Value::Object(data);
        changed
    }

    pub fn into_document(self) -> JobDocument {
        JobDocument {
            id: self.id,
            title: self.title,
            category: self.category,
            description: self.description,
            extra: into_object(self.data),
            created_at: self.created_at,
        }
    }
}

impl Application {
    pub fn into_document(self) -> ApplicationDocument {
        ApplicationDocument {
            id: self.id,
            email: self.email,
            job_id: self.job_id,
            extra: into_object(self.data),
            created_at: self.created_at,
        }
    }
}

impl FavoriteJob {
    pub fn into_document(self) -> ApplicationDocument {
        ApplicationDocument {
            id: self.id,
            email: self.email,
            job_id: self.job_id,
            extra: into_object(self.data),
            created_at: self.created_at,
        }
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
