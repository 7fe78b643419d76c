//! Sign-up handlers.

use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::ServerError;
use crate::router::{redirect_with_error, session_cookie};
use crate::user::RegisterUser;

const FORM: &str = "signup";

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub first_name: String,
    pub last_name: String,
    #[validate(length(
        min = 2,
        max = 32,
        message = "Username must contain 2 to 32 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Redirect to the sign-up form on the landing page.
pub async fn form() -> Redirect {
    Redirect::to("/?form=signup")
}

/// Handler to register a user and establish a session.
///
/// Expected failures become redirects carrying an error code; nothing on
/// this path surfaces as an uncaught fault.
pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(body): Form<Body>,
) -> Response {
    if body.validate().is_err() {
        return redirect_with_error(FORM, "server_error").into_response();
    }

    let user = match state
        .users()
        .register(RegisterUser {
            first_name: body.first_name,
            last_name: body.last_name,
            username: body.username,
            email: body.email,
            password: body.password,
            confirm_password: body.confirm_password,
        })
        .await
    {
        Ok(user) => user,
        Err(ServerError::Conflict) => {
            return redirect_with_error(FORM, "username_or_email_taken")
                .into_response();
        },
        Err(ServerError::PasswordMismatch) => {
            return redirect_with_error(FORM, "password_mismatch")
                .into_response();
        },
        Err(err) => {
            tracing::error!(error = %err, "sign-up failed");
            return redirect_with_error(FORM, "server_error").into_response();
        },
    };

    match state.sessions.create(user.id, &user.username).await {
        Ok(session) => (
            jar.add(session_cookie(&session)),
            Redirect::to("/applications"),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "session not established");
            redirect_with_error(FORM, "server_error").into_response()
        },
    }
}
