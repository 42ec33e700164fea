//! Request extractors whose rejections render through [`AppError`].
//!
//! Axum's stock `Json` and `Path` extractors answer malformed input with
//! plain-text bodies. These wrappers keep every failure in the
//! `{"message": ...}` shape.
//!
//! - [`JsonBody`]: the raw JSON body, left for the validation layer to inspect.
//! - [`EntityId`]: the single integer id segment of a route.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde_json::Value;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// JsonBody
// ---------------------------------------------------------------------------

/// Request body parsed as untyped JSON.
///
/// Syntax errors, a missing `Content-Type: application/json` header, and
/// oversized bodies all become [`AppError::BadRequest`] carrying axum's
/// rejection text.
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request(
        req: Request,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|rej| AppError::BadRequest(rej.body_text()))?;
            Ok(JsonBody(value))
        }
    }
}

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// The integer id captured by a `{id}` or `{user_id}` route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let Path(raw) = Path::<String>::from_request_parts(parts, state)
                .await
                .map_err(|rej| AppError::BadRequest(rej.body_text()))?;
            parse_id(&raw).map(EntityId)
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid id \"{raw}\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_segments_parse() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("-1").unwrap(), -1);
    }

    #[test]
    fn non_integer_segments_are_bad_requests() {
        for raw in ["abc", "1.5", "", "99999999999999999999"] {
            match parse_id(raw) {
                Err(AppError::BadRequest(msg)) => assert_eq!(msg, format!("Invalid id \"{raw}\"")),
                other => panic!("{raw:?} gave {other:?}"),
            }
        }
    }
}
