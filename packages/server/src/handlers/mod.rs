//! HTTP request handlers for the Postboard endpoints.
//!
//! Handlers are plain async functions that take Axum extractors and return
//! `Result<impl IntoResponse, AppError>`. Validation runs first, then the
//! existence checks, then the store write; the first failure returns.
//!
//! Existence checks and merge logic live here, not in storage.

pub mod posts;
pub mod users;

use std::sync::Arc;

use postboard_api::error::messages;

use crate::{error::AppError, storage::Storage};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found() -> AppError {
    AppError::NotFound(messages::ROUTE_NOT_FOUND.into())
}
