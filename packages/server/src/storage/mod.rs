//! Storage abstraction layer for the Postboard server.
//!
//! The [`Storage`] trait defines the contract between the HTTP handler layer
//! and persistence. Existence checks and merge logic live in the handlers;
//! storage reads and writes rows.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStorage`] | Tests, conformance suite, `DB_NAME=:memory:` |
//! | [`SqliteStorage`] | Production; durable single-file database |
//!
//! [`MemoryStorage`]: memory::MemoryStorage
//! [`SqliteStorage`]: sqlite::SqliteStorage

pub mod memory;
pub mod migrations;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use postboard::{NewPost, NewUser, Post, User};

use crate::config::DatabaseConfig;

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The addressed row does not exist (or vanished since it was read).
    #[error("not found")]
    NotFound,

    /// A post would reference a user that does not exist.
    #[error("user {0} does not exist")]
    UnknownUser(i64),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// The persistence contract for the server.
///
/// All methods are `async` and return `Result<_, StorageError>`. Implementations
/// must be `Send + Sync + 'static` so they can be held in an `Arc<dyn Storage>`.
///
/// Every [`Post`] returned by a read or write carries its owning [`User`] in
/// `post.user`.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    // --- Users ---------------------------------------------------------------

    /// Insert a user and return it with its generated `id`. Ids are never
    /// reused, even after deletes.
    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError>;

    /// Return all users, ordered by `id`.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// Retrieve a user by `id`. Returns `None` if not found.
    async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError>;

    /// Overwrite the stored row for `user.id` and return what was saved.
    ///
    /// The stored `email` is left untouched. Returns [`StorageError::NotFound`]
    /// if the user no longer exists.
    async fn save_user(&self, user: &User) -> Result<User, StorageError>;

    /// Delete a user and every post it owns. Returns the number of posts the
    /// cascade removed, or [`StorageError::NotFound`].
    async fn delete_user(&self, id: i64) -> Result<u64, StorageError>;

    // --- Posts ---------------------------------------------------------------

    /// Insert a post and return it with its generated `id`.
    ///
    /// Returns [`StorageError::UnknownUser`] if `post.user_id` does not exist
    /// at the moment of the insert.
    async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError>;

    /// Return all posts, ordered by `id`.
    async fn list_posts(&self) -> Result<Vec<Post>, StorageError>;

    /// Retrieve a post by `id`. Returns `None` if not found.
    async fn get_post(&self, id: i64) -> Result<Option<Post>, StorageError>;

    /// Return the posts owned by `user_id`, ordered by `id`. Empty when the
    /// user has no posts or does not exist.
    async fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, StorageError>;

    /// Overwrite the stored row for `post.id` and return what was saved.
    ///
    /// Returns [`StorageError::NotFound`] if the post no longer exists and
    /// [`StorageError::UnknownUser`] if `post.user_id` does not exist.
    async fn save_post(&self, post: &Post) -> Result<Post, StorageError>;

    /// Delete a post. Returns [`StorageError::NotFound`] if it does not exist.
    async fn delete_post(&self, id: i64) -> Result<(), StorageError>;
}

/// Open the store selected by `config` and bring its schema up to date.
///
/// `DB_NAME=:memory:` selects [`memory::MemoryStorage`]; anything else opens
/// (or creates) the SQLite file `<DB_NAME>.db` and runs pending migrations.
pub fn open(config: &DatabaseConfig) -> Result<Arc<dyn Storage>, StorageError> {
    if config.is_in_memory() {
        tracing::info!("storage: in-memory (data will not survive restart)");
        return Ok(Arc::new(memory::MemoryStorage::new()));
    }

    let path = config.sqlite_path();
    tracing::info!("storage: SQLite at {path} (database {config})");
    let storage = sqlite::SqliteStorage::open(&path)
        .map_err(|e| StorageError::Internal(format!("failed to open {path}: {e}")))?;
    let version = storage.migrate()?;
    tracing::info!("storage: schema at version {version}");
    Ok(Arc::new(storage))
}
