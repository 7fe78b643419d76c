//! Error handler for applitrack.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("username or email already taken")]
    Conflict,

    #[error("password confirmation does not match")]
    PasswordMismatch,

    /// Unknown login and wrong password are reported identically so the
    /// response never reveals which part of the credential failed.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// Missing record and foreign record collapse into the same outcome.
    #[error("unauthorized access")]
    Unauthorized,

    #[error("session store failure: {0}")]
    Session(String),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error(transparent)]
    Render(#[from] crate::render::RenderError),

    #[error("internal server error, {details}")]
    Internal { details: String },
}

/// Body returned on non-redirect failures.
#[derive(Debug, Serialize)]
struct ResponseError {
    error: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

fn json_response(status: StatusCode, body: &ResponseError) -> Response {
    if let Ok(body) = serde_json::to_string(body) {
        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap_or_else(|_| internal_server_error())
    } else {
        internal_server_error()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::Validation(validation_errors) => json_response(
                StatusCode::BAD_REQUEST,
                &ResponseError {
                    error: true,
                    message: "There were validation errors with your request."
                        .to_owned(),
                    errors: Some(parse_validation_errors(validation_errors)),
                },
            ),

            ServerError::Conflict => json_response(
                StatusCode::CONFLICT,
                &ResponseError {
                    error: true,
                    message: self.to_string(),
                    errors: None,
                },
            ),

            ServerError::PasswordMismatch => json_response(
                StatusCode::BAD_REQUEST,
                &ResponseError {
                    error: true,
                    message: self.to_string(),
                    errors: None,
                },
            ),

            ServerError::InvalidCredentials => json_response(
                StatusCode::UNAUTHORIZED,
                &ResponseError {
                    error: true,
                    message: self.to_string(),
                    errors: None,
                },
            ),

            ServerError::Unauthorized => {
                (StatusCode::FORBIDDEN, "Unauthorized access.").into_response()
            }

            ServerError::Session(details) => {
                tracing::error!(%details, "session store failure");
                internal_server_error()
            }

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "server returned 500 status");
                internal_server_error()
            }

            ServerError::Render(err) => {
                tracing::error!(error = %err, "render layer failure");
                internal_server_error()
            }

            ServerError::Internal { details } => {
                tracing::error!(%details, "server returned 500 status");
                internal_server_error()
            }
        }
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "error": true,
                "message": "Internal server error.",
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
