//! Shared plumbing for the HTTP handlers: the error type, the request
//! extractors, and the scoped session runner.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marquee_db::{DbPool, Session, SessionError};
use marquee_movies::MovieError;
use thiserror::Error;

/// Client-facing message for a missing movie.
pub const MOVIE_NOT_FOUND: &str = "La pelicula no existe";

/// API error type mapping to HTTP status codes.
///
/// Bodies have the shape `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An extractor refused the request; `status` is the one axum chose.
    #[error("rejected request: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Rejected { status, message } => (status, message),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({
            "detail": message
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// `Json` body extractor whose rejections use the `{"detail": ...}` shape.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor whose rejections use the `{"detail": ...}` shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<MovieError> for ApiError {
    fn from(e: MovieError) -> Self {
        match e {
            MovieError::NotFound(_) => ApiError::NotFound(MOVIE_NOT_FOUND.to_string()),
            MovieError::Database(e) => {
                ApiError::InternalServerError(format!("db query failed: {}", e))
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::InternalServerError(e.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::InternalServerError(format!("db commit failed: {}", e))
    }
}

/// Runs `f` with a fresh [`Session`] on the blocking thread pool.
///
/// The session is opened before `f` runs and dropped when it returns, so the
/// connection goes back to the pool on success, on error, and on panic.
pub async fn with_session<F, T>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Session) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut session = Session::open(&pool)?;
        f(&mut session)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}
