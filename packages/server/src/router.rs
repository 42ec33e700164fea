//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    error::panic_response,
    handlers::{not_found, posts, users, AppState},
    storage::Storage,
};

/// Build the complete application router with shared state.
///
/// Unknown paths and unsupported methods answer 404 `Route not found`; a
/// panicking handler answers the generic 500.
pub fn build_router(storage: Arc<dyn Storage>) -> Router {
    let state = AppState { storage };

    Router::new()
        // Users
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            get(users::get_by_id)
                .put(users::update)
                .delete(users::delete),
        )
        // Posts
        .route("/posts", get(posts::list).post(posts::create))
        .route(
            "/posts/{id}",
            get(posts::get_by_id)
                .put(posts::update)
                .delete(posts::delete),
        )
        .route("/posts/user/{user_id}", get(posts::list_by_user))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use postboard::{NewPost, NewUser, Post, User};
    use serde_json::json;

    use super::*;
    use crate::handlers::test_support::{app, send};
    use crate::storage::StorageError;

    /// A store whose reads fail, and whose writes panic.
    struct BrokenStorage;

    #[async_trait]
    impl Storage for BrokenStorage {
        async fn create_user(&self, _: &NewUser) -> Result<User, StorageError> {
            panic!("create_user exploded")
        }
        async fn list_users(&self) -> Result<Vec<User>, StorageError> {
            Err(StorageError::Internal("disk I/O error at /var/lib/postboard.db".into()))
        }
        async fn get_user(&self, _: i64) -> Result<Option<User>, StorageError> {
            Err(StorageError::Internal("database is locked".into()))
        }
        async fn save_user(&self, _: &User) -> Result<User, StorageError> {
            panic!("save_user exploded")
        }
        async fn delete_user(&self, _: i64) -> Result<u64, StorageError> {
            panic!("delete_user exploded")
        }
        async fn create_post(&self, _: &NewPost) -> Result<Post, StorageError> {
            panic!("create_post exploded")
        }
        async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
            Err(StorageError::Internal("no such table: posts".into()))
        }
        async fn get_post(&self, _: i64) -> Result<Option<Post>, StorageError> {
            Err(StorageError::Internal("no such table: posts".into()))
        }
        async fn list_posts_by_user(&self, _: i64) -> Result<Vec<Post>, StorageError> {
            Err(StorageError::Internal("no such table: posts".into()))
        }
        async fn save_post(&self, _: &Post) -> Result<Post, StorageError> {
            panic!("save_post exploded")
        }
        async fn delete_post(&self, _: i64) -> Result<(), StorageError> {
            panic!("delete_post exploded")
        }
    }

    fn broken_app() -> Router {
        build_router(Arc::new(BrokenStorage))
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, body) = send(&app(), "GET", "/comments", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Route not found" }));
    }

    #[tokio::test]
    async fn unsupported_method_is_404() {
        let (status, body) = send(&app(), "PATCH", "/users", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn storage_failures_are_scrubbed_500s() {
        let app = broken_app();
        for uri in ["/users", "/users/1", "/posts", "/posts/1", "/posts/user/1"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body, json!({ "message": "Internal server error" }), "{uri}");
        }
    }

    #[tokio::test]
    async fn handler_panics_become_500s() {
        let (status, body) = send(
            &broken_app(),
            "POST",
            "/users",
            Some(json!({ "firstName": "A", "lastName": "B", "email": "a@b.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn validation_runs_before_storage() {
        // The broken store would panic if it were reached.
        let (status, body) =
            send(&broken_app(), "POST", "/users", Some(json!({ "firstName": "A" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "\"lastName\" is required");
    }
}
