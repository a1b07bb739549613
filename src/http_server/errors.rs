//! API error responses.
//!
//! Bodies carry a safe summary and a kind; detail stays in the logs.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::observability::Event;
use crate::records::RecordError;

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

/// Wire form of [`ApiError`]
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub kind: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    /// 400 with a caller-facing message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        let status = status_from(err.status_code());
        let message = match &err {
            RecordError::Validation(detail) => detail.clone(),
            RecordError::NotFound(_) => "Record not found".to_string(),
            RecordError::Conflict(_) => {
                "Record was modified concurrently; reload and retry".to_string()
            }
            RecordError::CorruptRecord(_) => "Record could not be decrypted".to_string(),
            RecordError::BackingStore(_) => "Record storage is unavailable".to_string(),
        };

        match &err {
            RecordError::Conflict(blob) => {
                tracing::info!(event = Event::RecordConflict.as_str(), blob = %blob, "stale version")
            }
            RecordError::CorruptRecord(_) | RecordError::BackingStore(_) => tracing::error!(
                event = Event::RequestFailed.as_str(),
                kind = err.kind(),
                error = %err,
                "record operation failed"
            ),
            _ => {}
        }

        Self::new(status, err.kind(), message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(status_from(err.status_code()), err.kind(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        Self::validation("Request body must be a valid JSON object")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing_store::BlobStoreError;

    #[test]
    fn test_record_errors_hide_detail() {
        let err: ApiError = RecordError::BackingStore(BlobStoreError::Upstream {
            status: 500,
            message: "token ghp_abc expired".to_string(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.kind(), "backing_store");
        assert!(!err.message().contains("ghp_abc"));

        let err: ApiError = RecordError::CorruptRecord("blob: bad padding".into()).into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!err.message().contains("padding"));
    }

    #[test]
    fn test_validation_keeps_message() {
        let err: ApiError = RecordError::Validation("email is required".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "email is required");
    }

    #[test]
    fn test_auth_mapping() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.kind(), "auth");

        let err: ApiError = AuthError::NotConfigured.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "config");
    }
}
