//! Application-level error type returned by handlers.
//!
//! Every variant serialises to the [`ErrorResponse`] JSON format
//! (`{"message": ...}`) with its HTTP status code. This is the only place a
//! failure becomes a response; handlers return `Err(AppError)` and stop.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use postboard::ValidationError;
use postboard_api::{error::messages, ErrorResponse};

use crate::storage::StorageError;

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or invalid input, or an attempt to change an immutable field.
    BadRequest(String),
    /// The addressed or referenced entity does not exist.
    NotFound(String),
    /// Anything unexpected. The message is logged, never returned.
    Internal(String),
}

impl AppError {
    pub fn user_not_found() -> Self {
        AppError::NotFound(messages::USER_NOT_FOUND.into())
    }

    pub fn post_not_found() -> Self {
        AppError::NotFound(messages::POST_NOT_FOUND.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg,
            AppError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                messages::INTERNAL_ERROR.to_string()
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::NotFound("not found".into()),
            StorageError::UnknownUser(_) => AppError::user_not_found(),
            StorageError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Response for a handler that panicked. Installed with
/// `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal(format!("panic: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn kinds_map_to_status_and_message() {
        let (status, body) = render(AppError::BadRequest("bad".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "message": "bad" }));

        let (status, body) = render(AppError::user_not_found()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn internal_detail_is_scrubbed() {
        let (status, body) =
            render(AppError::Internal("disk I/O error at /var/lib/db".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn validation_errors_become_bad_requests() {
        let err: AppError = ValidationError::Required("email").into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "\"email\" is required");
    }

    #[tokio::test]
    async fn storage_errors_map_by_kind() {
        let err: AppError = StorageError::UnknownUser(9).into();
        assert_eq!(render(err).await.1["message"], "User not found");

        let err: AppError = StorageError::Internal("locked".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = StorageError::NotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn panics_render_as_scrubbed_500() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }
}
