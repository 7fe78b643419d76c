//! Job application handlers, all behind the session gate.

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::application::{NewApplication, Status, UpdateApplication};
use crate::error::Result;
use crate::session::Session;

fn date_to_utc(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBody {
    #[validate(length(min = 1, message = "Company name is required."))]
    pub company_name: String,
    #[validate(length(min = 1, message = "Job title is required."))]
    pub job_title: String,
    pub application_date: Option<NaiveDate>,
    pub status: Option<Status>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    #[validate(length(min = 1, message = "Company name is required."))]
    pub company_name: String,
    #[validate(length(min = 1, message = "Job title is required."))]
    pub job_title: String,
    pub application_date: NaiveDate,
    pub status: Status,
    #[serde(default)]
    pub notes: String,
}

/// List all records owned by the session identity.
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>> {
    let applications =
        state.records().list_for_owner(session.user_id).await?;

    let body = state.render.render(
        "applications/index",
        json!({
            "applications": applications,
            "user": session.profile(),
        }),
    )?;

    Ok(Html(body))
}

/// Blank creation form.
pub async fn new_form(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>> {
    let body = state
        .render
        .render("applications/new", json!({ "user": session.profile() }))?;

    Ok(Html(body))
}

/// Create a record owned by the session identity.
///
/// Owner is forced to the session identity regardless of any client-supplied
/// value; date and status fall back to their defaults.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(body): Form<NewBody>,
) -> Result<Response> {
    body.validate()?;

    state
        .records()
        .insert(
            session.user_id,
            NewApplication {
                company_name: body.company_name,
                job_title: body.job_title,
                application_date: body.application_date.map(date_to_utc),
                status: body.status,
                notes: body.notes,
            },
        )
        .await?;

    Ok(Redirect::to("/applications").into_response())
}

/// Single record details, ownership-checked.
pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>> {
    let application = state.records().find_owned(session.user_id, id).await?;

    let body = state
        .render
        .render("applications/show", json!({ "application": application }))?;

    Ok(Html(body))
}

/// Edit form for an owned record.
pub async fn edit_form(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>> {
    let application = state.records().find_owned(session.user_id, id).await?;

    let body = state
        .render
        .render("applications/edit", json!({ "application": application }))?;

    Ok(Html(body))
}

/// Replace all mutable fields of an owned record.
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Form(body): Form<UpdateBody>,
) -> Result<Response> {
    body.validate()?;

    state
        .records()
        .update_owned(
            session.user_id,
            id,
            UpdateApplication {
                company_name: body.company_name,
                job_title: body.job_title,
                application_date: date_to_utc(body.application_date),
                status: body.status,
                notes: body.notes,
            },
        )
        .await?;

    Ok(Redirect::to(&format!("/applications/{id}")).into_response())
}

/// Permanently delete an owned record.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    state.records().delete_owned(session.user_id, id).await?;

    Ok(Redirect::to("/applications").into_response())
}

#[cfg(test)]
mod tests {
    use crate::application::Status;
    use crate::*;
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};
    use uuid::Uuid;

    async fn create_record(
        app: axum::Router,
        cookie: &str,
        body: &str,
    ) -> axum::http::Response<axum::body::Body> {
        make_request(
            app,
            Method::POST,
            "/applications",
            body.to_owned(),
            Some(cookie),
        )
        .await
    }

    async fn last_record_id(pool: &Pool<Postgres>) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM job_applications ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_requires_session(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::GET,
            "/applications",
            String::default(),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/sign-in"
        );
    }

    #[sqlx::test]
    async fn test_create_applies_defaults(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let cookie =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;

        let response = create_record(
            app,
            &cookie,
            "companyName=Acme&jobTitle=Engineer",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/applications"
        );

        let (status, notes) = sqlx::query_as::<_, (Status, String)>(
            "SELECT status, notes FROM job_applications LIMIT 1",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(status, Status::Applied);
        assert_eq!(notes, "");
    }

    #[sqlx::test]
    async fn test_create_rejects_missing_company(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let cookie =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;

        let response =
            create_record(app, &cookie, "companyName=&jobTitle=Engineer")
                .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM job_applications",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    async fn test_round_trip(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let cookie =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;

        create_record(
            app.clone(),
            &cookie,
            "companyName=Acme&jobTitle=Engineer&status=Interview\
             &applicationDate=2025-03-01&notes=phone+screen+done",
        )
        .await;
        let id = last_record_id(&pool).await;

        let response = make_request(
            app.clone(),
            Method::GET,
            &format!("/applications/{id}"),
            String::default(),
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Acme"));
        assert!(body.contains("Interview"));
        assert!(body.contains("phone screen done"));

        // list shows it too.
        let response = make_request(
            app,
            Method::GET,
            "/applications",
            String::default(),
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("Acme"));
    }

    #[sqlx::test]
    async fn test_foreign_record_unauthorized(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let alice =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;
        let bob = router::sign_up_for_tests(app.clone(), "bob", "pw2").await;

        create_record(
            app.clone(),
            &alice,
            "companyName=Acme&jobTitle=Engineer",
        )
        .await;
        let id = last_record_id(&pool).await;

        for method in [Method::GET, Method::DELETE] {
            let response = make_request(
                app.clone(),
                method,
                &format!("/applications/{id}"),
                String::default(),
                Some(&bob),
            )
            .await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        // record unchanged.
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM job_applications",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    async fn test_list_scoped_to_owner(pool: Pool<Postgres>) {
        let app = app(router::state(pool));
        let alice =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;
        let bob = router::sign_up_for_tests(app.clone(), "bob", "pw2").await;

        create_record(
            app.clone(),
            &alice,
            "companyName=Acme&jobTitle=Engineer",
        )
        .await;
        create_record(
            app.clone(),
            &bob,
            "companyName=Globex&jobTitle=Analyst",
        )
        .await;

        let response = make_request(
            app,
            Method::GET,
            "/applications",
            String::default(),
            Some(&bob),
        )
        .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Globex"));
        assert!(!body.contains("Acme"));
    }

    #[sqlx::test]
    async fn test_update_replaces_mutable_fields(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let cookie =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;

        create_record(
            app.clone(),
            &cookie,
            "companyName=Acme&jobTitle=Engineer",
        )
        .await;
        let id = last_record_id(&pool).await;

        let response = make_request(
            app,
            Method::PUT,
            &format!("/applications/{id}"),
            "companyName=Acme+Corp&jobTitle=Senior+Engineer\
             &applicationDate=2025-03-02&status=Offer&notes=negotiating"
                .to_owned(),
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            &format!("/applications/{id}")
        );

        let (company, status, owner) =
            sqlx::query_as::<_, (String, Status, Uuid)>(
                "SELECT company_name, status, user_id FROM job_applications \
                 WHERE id = $1",
            )
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(company, "Acme Corp");
        assert_eq!(status, Status::Offer);

        // owner survived the full-field replace.
        let alice_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE username = 'alice'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(owner, alice_id);
    }

    #[sqlx::test]
    async fn test_delete_then_delete_again(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let cookie =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;

        create_record(
            app.clone(),
            &cookie,
            "companyName=Acme&jobTitle=Engineer",
        )
        .await;
        let id = last_record_id(&pool).await;

        let first = make_request(
            app.clone(),
            Method::DELETE,
            &format!("/applications/{id}"),
            String::default(),
            Some(&cookie),
        )
        .await;
        assert_eq!(first.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            first.headers().get(header::LOCATION).unwrap(),
            "/applications"
        );

        // second delete behaves like a never-existing id.
        let second = make_request(
            app.clone(),
            Method::DELETE,
            &format!("/applications/{id}"),
            String::default(),
            Some(&cookie),
        )
        .await;
        assert_eq!(second.status(), StatusCode::FORBIDDEN);

        let never = make_request(
            app,
            Method::DELETE,
            &format!("/applications/{}", Uuid::new_v4()),
            String::default(),
            Some(&cookie),
        )
        .await;
        assert_eq!(never.status(), StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_edit_form_ownership_checked(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let alice =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;
        let bob = router::sign_up_for_tests(app.clone(), "bob", "pw2").await;

        create_record(
            app.clone(),
            &alice,
            "companyName=Acme&jobTitle=Engineer",
        )
        .await;
        let id = last_record_id(&pool).await;

        let owner_view = make_request(
            app.clone(),
            Method::GET,
            &format!("/applications/{id}/edit"),
            String::default(),
            Some(&alice),
        )
        .await;
        assert_eq!(owner_view.status(), StatusCode::OK);

        let foreign_view = make_request(
            app,
            Method::GET,
            &format!("/applications/{id}/edit"),
            String::default(),
            Some(&bob),
        )
        .await;
        assert_eq!(foreign_view.status(), StatusCode::FORBIDDEN);
    }
}
