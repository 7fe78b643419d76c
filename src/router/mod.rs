pub mod applications;
pub mod landing;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

use axum::response::Redirect;
use axum_extra::extract::cookie::Cookie;

use crate::session::{SESSION_COOKIE, Session};

/// Redirect back to the landing page carrying a machine-readable error code
/// for the render layer to translate.
pub(crate) fn redirect_with_error(form: &str, code: &str) -> Redirect {
    Redirect::to(&format!("/?form={form}&error={code}"))
}

/// Cookie binding the client to a server-side session.
pub(crate) fn session_cookie(session: &Session) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .build()
}

#[cfg(test)]
pub(crate) fn state(pool: sqlx::PgPool) -> crate::AppState {
    use std::sync::Arc;

    // lighter hashing parameters: test users, not real credentials.
    let argon2 = crate::config::Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    };

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        db: crate::database::Database {
            postgres: pool.clone(),
        },
        crypto: Arc::new(
            crate::crypto::PasswordManager::new(Some(argon2))
                .expect("argon2 params"),
        ),
        sessions: crate::session::SessionStore::new(
            pool,
            crate::session::DEFAULT_TTL_HOURS,
        ),
        render: Arc::new(crate::render::DebugRenderer),
    }
}

/// Sign up a user and return the session cookie header value.
#[cfg(test)]
pub(crate) async fn sign_up_for_tests(
    app: axum::Router,
    username: &str,
    password: &str,
) -> String {
    use axum::http::{Method, StatusCode, header};

    let body = format!(
        "firstName=Test&lastName=User&username={username}\
         &email={username}%40example.com\
         &password={password}&confirmPassword={password}"
    );
    let response = crate::make_request(
        app,
        Method::POST,
        "/auth/sign-up",
        body,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_owned()
}
