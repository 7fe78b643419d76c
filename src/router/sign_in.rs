//! Sign-in handlers.

use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::ServerError;
use crate::router::{redirect_with_error, session_cookie};

const FORM: &str = "signin";

#[derive(Debug, Serialize, Deserialize)]
pub struct Body {
    /// Username OR email.
    pub login: String,
    pub password: String,
}

/// Redirect to the sign-in form on the landing page.
pub async fn form() -> Redirect {
    Redirect::to("/?form=signin")
}

/// Handler to authenticate a user and establish a session.
pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(body): Form<Body>,
) -> Response {
    let user = match state
        .users()
        .authenticate(&body.login, &body.password)
        .await
    {
        Ok(user) => user,
        Err(ServerError::InvalidCredentials) => {
            return redirect_with_error(FORM, "invalid_credentials")
                .into_response();
        },
        Err(err) => {
            tracing::error!(error = %err, "sign-in failed");
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
