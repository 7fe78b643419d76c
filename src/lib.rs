//! Applitrack is a session-backed job-application tracker.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
mod application;
pub mod config;
mod crypto;
mod database;
pub mod error;
mod middleware;
pub mod render;
mod router;
mod session;
mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::header;
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
pub use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: axum::http::Method,
    path: &str,
    body: String,
    cookie: Option<&str>,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut builder = Request::builder().method(method).uri(path).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.oneshot(builder.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub crypto: Arc<crypto::PasswordManager>,
    pub sessions: session::SessionStore,
    pub render: Arc<dyn render::Renderer>,
}

impl AppState {
    /// User manager bound to this state.
    pub fn users(&self) -> user::UserService {
        user::UserService::new(
            self.db.postgres.clone(),
            Arc::clone(&self.crypto),
        )
    }

    /// Application record manager bound to this state.
    pub fn records(&self) -> application::ApplicationRepository {
        application::ApplicationRepository::new(self.db.postgres.clone())
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::COOKIE, header::SET_COOKIE]));

    // every record route passes the session gate before its handler runs.
    let applications = Router::new()
        .route(
            "/applications",
            get(router::applications::list).post(router::applications::create),
        )
        .route("/applications/new", get(router::applications::new_form))
        .route(
            "/applications/{id}",
            get(router::applications::show)
                .put(router::applications::update)
                .delete(router::applications::destroy),
        )
        .route(
            "/applications/{id}/edit",
            get(router::applications::edit_form),
        )
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    Router::new()
        // `GET /` goes to the landing page.
        .route("/", get(router::landing::handler))
        // `POST /auth/sign-up` goes to `Register`.
        .route(
            "/auth/sign-up",
            get(router::sign_up::form).post(router::sign_up::handler),
        )
        // `POST /auth/sign-in` goes to `Authenticate`.
        .route(
            "/auth/sign-in",
            get(router::sign_in::form).post(router::sign_in::handler),
        )
        // `GET /auth/sign-out` goes to `Terminate`.
        .route("/auth/sign-out", get(router::sign_out::handler))
        .merge(applications)
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read();

    let db = match config.postgres {
        Some(ref config) => {
            database::Database::new(
                &config.address,
                &config
                    .username
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &config
                    .password
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &config
                    .database
                    .clone()
                    .unwrap_or(database::DEFAULT_DATABASE_NAME.into()),
                config.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?
        },
        None => {
            tracing::error!("missing `postgres` entry on `config.yaml` file");
            std::process::exit(0);
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.postgres).await?;

    let crypto =
        Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    let sessions = session::SessionStore::new(
        db.postgres.clone(),
        config
            .session
            .as_ref()
            .map(|s| s.ttl_hours)
            .unwrap_or(session::DEFAULT_TTL_HOURS),
    );

    Ok(AppState {
        config,
        db,
        crypto,
        sessions,
        render: Arc::new(render::DebugRenderer),
    })
}
