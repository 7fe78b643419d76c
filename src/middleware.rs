//! Middlewares for routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::Result;
use crate::session::{SESSION_COOKIE, Session};

pub const SIGN_IN_PATH: &str = "/auth/sign-in";

/// Resolve the session attached to a cookie jar, if any.
pub async fn session_from_jar(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<Session>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    state.sessions.find(cookie.value()).await
}

/// Gate applied to every protected route.
///
/// Resolves the session once and hands it to handlers as an extension;
/// requests without a valid, non-expired session are redirected to the
/// sign-in entry point before any handler runs.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match session_from_jar(&state, &jar).await {
        Ok(Some(session)) => session,
        Ok(None) => return Redirect::to(SIGN_IN_PATH).into_response(),
        Err(err) => return err.into_response(),
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}
