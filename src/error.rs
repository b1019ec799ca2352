use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{repository::RepoError, storage::StorageError};

/// AppError
///
/// The application-level failure type. Storage and persistence failures are
/// deliberately surfaced to the caller as distinct error responses instead of
/// being logged and swallowed; the log entry is written once, here, at the
/// response boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("upload could not be read: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

/// ServerErrorTemplate
///
/// The page rendered for any surfaced internal failure.
#[derive(Template)]
#[template(path = "errors/server_error.html")]
struct ServerErrorTemplate {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        match (ServerErrorTemplate {}).render() {
            Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
            // Rendering the error page itself failed; fall back to plain text.
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response(),
        }
    }
}
