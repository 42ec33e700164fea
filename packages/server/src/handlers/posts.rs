//! Post handlers: `/posts`, `/posts/{id}`, and `/posts/user/{user_id}`.
//!
//! Every post in a response embeds its owner under `user`. The owner is
//! checked before each write; the store's foreign key catches an owner
//! deleted between that check and the write, and the error maps to the same
//! 404.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use postboard::{validate_post, validate_post_changes, NewPost, Post, ValidationError};
use postboard_api::MessageResponse;

use crate::{
    error::AppError,
    extract::{EntityId, JsonBody},
    storage::StorageError,
};

use super::AppState;

/// `POST /posts`: create a post owned by an existing user.
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let draft = validate_post(&body)?;
    let user_id = draft.user_id.ok_or(ValidationError::Required("userId"))?;

    if state.storage.get_user(user_id).await?.is_none() {
        return Err(AppError::user_not_found());
    }

    let post = state
        .storage
        .create_post(&NewPost {
            title: draft.title,
            description: draft.description,
            user_id,
        })
        .await?;
    tracing::info!(post_id = post.id, user_id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /posts`: every post, ordered by id.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(state.storage.list_posts().await?))
}

/// `GET /posts/{id}`
pub async fn get_by_id(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<Post>, AppError> {
    let post = state
        .storage
        .get_post(id)
        .await?
        .ok_or_else(AppError::post_not_found)?;
    Ok(Json(post))
}

/// `GET /posts/user/{user_id}`: the user's posts; `[]` when there are none,
/// including when the user does not exist.
pub async fn list_by_user(
    State(state): State<AppState>,
    EntityId(user_id): EntityId,
) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(state.storage.list_posts_by_user(user_id).await?))
}

/// `PUT /posts/{id}`: merge the supplied fields into the stored post.
///
/// A `userId` that differs from the current owner must name an existing
/// user; `"userId": null` keeps the current owner.
pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    JsonBody(body): JsonBody,
) -> Result<Json<Post>, AppError> {
    let changes = validate_post_changes(&body)?;

    let mut post = state
        .storage
        .get_post(id)
        .await?
        .ok_or_else(AppError::post_not_found)?;

    if let Some(user_id) = changes.user_id.filter(|&u| u != post.user_id) {
        if state.storage.get_user(user_id).await?.is_none() {
            return Err(AppError::user_not_found());
        }
    }
    post.merge(changes);

    let saved = state.storage.save_post(&post).await.map_err(|e| match e {
        StorageError::NotFound => AppError::post_not_found(),
        other => other.into(),
    })?;
    tracing::info!(post_id = id, user_id = saved.user_id, "post updated");
    Ok(Json(saved))
}

/// `DELETE /posts/{id}`
pub async fn delete(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<MessageResponse>, AppError> {
    state.storage.delete_post(id).await.map_err(|e| match e {
        StorageError::NotFound => AppError::post_not_found(),
        other => other.into(),
    })?;
    tracing::info!(post_id = id, "post deleted");
    Ok(Json(MessageResponse::post_deleted()))
}
