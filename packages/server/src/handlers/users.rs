//! User handlers: `/users` and `/users/{id}`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use postboard::{validate_user, validate_user_changes, User};
use postboard_api::MessageResponse;

use crate::{
    error::AppError,
    extract::{EntityId, JsonBody},
    storage::StorageError,
};

use super::AppState;

/// `POST /users`: create a user. Returns 201 with the stored record.
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let new_user = validate_user(&body)?;
    let user = state.storage.create_user(&new_user).await?;
    tracing::info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users`: every user, ordered by id.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.storage.list_users().await?))
}

/// `GET /users/{id}`
pub async fn get_by_id(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<User>, AppError> {
    let user = state
        .storage
        .get_user(id)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    Ok(Json(user))
}

/// `PUT /users/{id}`: merge the supplied fields into the stored user.
///
/// `email` is immutable: any body carrying it is a 400, whatever its value.
pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    JsonBody(body): JsonBody,
) -> Result<Json<User>, AppError> {
    let changes = validate_user_changes(&body)?;

    let mut user = state
        .storage
        .get_user(id)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    user.merge(changes);

    let saved = state.storage.save_user(&user).await.map_err(|e| match e {
        StorageError::NotFound => AppError::user_not_found(),
        other => other.into(),
    })?;
    tracing::info!(user_id = id, "user updated");
    Ok(Json(saved))
}

/// `DELETE /users/{id}`: delete the user and every post it owns.
pub async fn delete(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = state.storage.delete_user(id).await.map_err(|e| match e {
        StorageError::NotFound => AppError::user_not_found(),
        other => other.into(),
    })?;
    tracing::info!(user_id = id, posts_removed = removed, "user deleted");
    Ok(Json(MessageResponse::user_deleted()))
}
