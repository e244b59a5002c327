//! HTTP error responses.

use std::fmt;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::archive::ArchiveError;

/// Tracing target for error conversions.
const TRACING_TARGET: &str = "zipcast::server::error";

/// An error returned from a handler, rendered as a JSON body.
#[derive(Debug)]
#[must_use = "errors do nothing unless returned"]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

/// Response body of every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    name: &'a str,
    message: &'a str,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            name: self.status.canonical_reason().unwrap_or("Error"),
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ArchiveError> for HttpError {
    fn from(error: ArchiveError) -> Self {
        let status = match error {
            ArchiveError::EmptyInput => StatusCode::BAD_REQUEST,
            ArchiveError::SourceUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ArchiveError::IoFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(target: TRACING_TARGET, error = %error, "archive creation failed");
        } else {
            tracing::debug!(target: TRACING_TARGET, error = %error, "archive request rejected");
        }

        Self::new(status, error.to_string())
    }
}

impl From<MultipartError> for HttpError {
    fn from(error: MultipartError) -> Self {
        tracing::debug!(target: TRACING_TARGET, error = %error, "invalid multipart body");
        // Oversized bodies surface here as 413 rather than 400
        Self::new(
            error.status(),
            format!("Invalid multipart data: {}", error.body_text()),
        )
    }
}

impl From<MultipartRejection> for HttpError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!(target: TRACING_TARGET, error = %rejection, "request is not multipart");
        Self::new(
            rejection.status(),
            format!("Invalid multipart data: {}", rejection.body_text()),
        )
    }
}

/// A specialized [`Result`] type for handlers.
pub type Result<T, E = HttpError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn archive_errors_map_to_statuses() {
        let cases = [
            (ArchiveError::EmptyInput, StatusCode::BAD_REQUEST),
            (
                ArchiveError::SourceUnavailable(io::Error::from(io::ErrorKind::NotFound)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ArchiveError::IoFailure(io::Error::other("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            let message = error.to_string();
            let http = HttpError::from(error);
            assert_eq!(http.status(), status);
            assert_eq!(http.message(), message);
        }
    }

    #[test]
    fn io_failure_message_carries_cause() {
        let http = HttpError::from(ArchiveError::IoFailure(io::Error::other("disk full")));
        assert_eq!(
            http.message(),
            "One or more files cannot be processed: disk full"
        );
    }
}
