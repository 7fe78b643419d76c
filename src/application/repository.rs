//! Handle database requests, scoped by ownership.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::application::{JobApplication, NewApplication, UpdateApplication};
use crate::error::{Result, ServerError};

const APPLICATION_COLUMNS: &str = "id, user_id, company_name, job_title, \
     application_date, status, notes, created_at";

#[derive(Clone)]
pub struct ApplicationRepository {
    pool: Pool<Postgres>,
}

impl ApplicationRepository {
    /// Create a new [`ApplicationRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All records owned by `uid`, in insertion order.
    pub async fn list_for_owner(
        &self,
        uid: Uuid,
    ) -> Result<Vec<JobApplication>> {
        let query = format!(
            r#"SELECT {APPLICATION_COLUMNS} FROM job_applications
                WHERE user_id = $1
                ORDER BY created_at"#
        );

        let records = sqlx::query_as::<_, JobApplication>(&query)
            .bind(uid)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Insert a record owned by `uid`, applying defaults for date, status
    /// and notes.
    pub async fn insert(
        &self,
        uid: Uuid,
        input: NewApplication,
    ) -> Result<JobApplication> {
        let query = format!(
            r#"INSERT INTO job_applications
                (user_id, company_name, job_title, application_date, status, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {APPLICATION_COLUMNS}"#
        );

        let record = sqlx::query_as::<_, JobApplication>(&query)
            .bind(uid)
            .bind(&input.company_name)
            .bind(&input.job_title)
            .bind(input.application_date.unwrap_or_else(Utc::now))
            .bind(input.status.unwrap_or_default())
            .bind(input.notes.unwrap_or_default())
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    /// The ownership predicate: record exists AND record owner equals `uid`.
    ///
    /// Missing and foreign records produce the same [`ServerError::Unauthorized`]
    /// outcome; the two causes are only distinguished in debug logs.
    pub async fn find_owned(
        &self,
        uid: Uuid,
        id: Uuid,
    ) -> Result<JobApplication> {
        let query = format!(
            r#"SELECT {APPLICATION_COLUMNS} FROM job_applications
                WHERE id = $1"#
        );

        let record = sqlx::query_as::<_, JobApplication>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match record {
            Some(record) if record.user_id == uid => Ok(record),
            Some(_) => {
                tracing::debug!(%id, "record owned by another user");
                Err(ServerError::Unauthorized)
            },
            None => {
                tracing::debug!(%id, "record does not exist");
                Err(ServerError::Unauthorized)
            },
        }
    }

    /// Replace all mutable fields of an owned record.
    pub async fn update_owned(
        &self,
        uid: Uuid,
        id: Uuid,
        input: UpdateApplication,
    ) -> Result<JobApplication> {
        self.find_owned(uid, id).await?;

        let query = format!(
            r#"UPDATE job_applications
                SET company_name = $1, job_title = $2, application_date = $3,
                    status = $4, notes = $5
                WHERE id = $6 AND user_id = $7
                RETURNING {APPLICATION_COLUMNS}"#
        );

        let record = sqlx::query_as::<_, JobApplication>(&query)
            .bind(&input.company_name)
            .bind(&input.job_title)
            .bind(input.application_date)
            .bind(input.status)
            .bind(&input.notes)
            .bind(id)
            .bind(uid)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    /// Permanently remove an owned record.
    pub async fn delete_owned(&self, uid: Uuid, id: Uuid) -> Result<()> {
        self.find_owned(uid, id).await?;

        sqlx::query(
            r#"DELETE FROM job_applications WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(uid)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
