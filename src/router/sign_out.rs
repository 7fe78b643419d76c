//! Sign-out handler.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;

use crate::AppState;
use crate::session::SESSION_COOKIE;

/// Destroy the server-side session and clear the cookie.
///
/// A store failure is reported but non-fatal: the client is still
/// redirected, with `logout_failed` in the URL.
pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Response {
    let jar = match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let token = cookie.value().to_owned();
            if let Err(err) = state.sessions.destroy(&token).await {
                tracing::error!(error = %err, "session not destroyed");
                return Redirect::to("/?error=logout_failed").into_response();
            }
            jar.remove(
                Cookie::build((SESSION_COOKIE, "")).path("/").build(),
            )
        },
        None => jar,
    };

    (jar, Redirect::to("/")).into_response()
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode, header};
    use sqlx::{Pool, Postgres};

    #[sqlx::test]
    async fn test_sign_out_destroys_session(pool: Pool<Postgres>) {
        let app = app(router::state(pool.clone()));
        let cookie =
            router::sign_up_for_tests(app.clone(), "alice", "pw1").await;

        let response = make_request(
            app.clone(),
            Method::GET,
            "/auth/sign-out",
            String::default(),
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        // replaying the old cookie no longer grants access.
        let replay = make_request(
            app,
            Method::GET,
            "/applications",
            String::default(),
            Some(&cookie),
        )
        .await;
        assert_eq!(replay.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            replay.headers().get(header::LOCATION).unwrap(),
            "/auth/sign-in"
        );

        let remaining = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sessions",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(remaining, 0);
    }

    #[sqlx::test]
    async fn test_sign_out_without_session(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::GET,
            "/auth/sign-out",
            String::default(),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }
}
