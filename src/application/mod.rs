mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job application as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    /// Owner; fixed at creation, never altered by a payload.
    pub user_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub application_date: DateTime<Utc>,
    pub status: Status,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Progress of a job application.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "application_status")]
pub enum Status {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

/// Create input; defaults are applied where fields are absent.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub company_name: String,
    pub job_title: String,
    pub application_date: Option<DateTime<Utc>>,
    pub status: Option<Status>,
    pub notes: Option<String>,
}

/// Allow-listed update; naming exactly the mutable fields so a payload can
/// never reach `id` or `user_id`.
#[derive(Debug, Clone)]
pub struct UpdateApplication {
    pub company_name: String,
    pub job_title: String,
    pub application_date: DateTime<Utc>,
    pub status: Status,
    pub notes: String,
}
