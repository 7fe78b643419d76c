//! Landing page; redirects straight to the records list when signed in.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::error::Result;
use crate::middleware::session_from_jar;

const DEFAULT_FORM: &str = "signin";

#[derive(Debug, Deserialize)]
pub struct Params {
    form: Option<String>,
    error: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<Params>,
) -> Result<Response> {
    if session_from_jar(&state, &jar).await?.is_some() {
        return Ok(Redirect::to("/applications").into_response());
    }

    let body = state.render.render(
        "index",
        json!({
            "user": null,
            "formType": params.form.as_deref().unwrap_or(DEFAULT_FORM),
            "error": params.error,
        }),
    )?;

    Ok(Html(body).into_response())
}
