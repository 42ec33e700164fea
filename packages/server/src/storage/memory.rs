//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and ephemeral servers.
//!
//! Rows are kept in [`BTreeMap`]s keyed by id, so listing in id order is a
//! plain iteration. Id counters only move forward, which keeps ids unique
//! across deletes the same way `AUTOINCREMENT` does in SQLite.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use postboard::{NewPost, NewUser, Post, User};

use super::{Storage, StorageError};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    /// Stored without the embedded `user`; it is joined in on read.
    posts: BTreeMap<i64, Post>,
    last_user_id: i64,
    last_post_id: i64,
}

impl Inner {
    fn with_owner(&self, post: &Post) -> Post {
        Post {
            user: self.users.get(&post.user_id).cloned(),
            ..post.clone()
        }
    }

    fn joined_post(&self, id: i64) -> Option<Post> {
        self.posts.get(&id).map(|p| self.with_owner(p))
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`Storage`].
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StorageError> {
        self.inner
            .read()
            .map_err(|_| StorageError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StorageError> {
        self.inner
            .write()
            .map_err(|_| StorageError::Internal("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for MemoryStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let mut inner = self.write()?;
        inner.last_user_id += 1;
        let user = User {
            id: inner.last_user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn save_user(&self, user: &User) -> Result<User, StorageError> {
        let mut inner = self.write()?;
        let stored = inner.users.get_mut(&user.id).ok_or(StorageError::NotFound)?;
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        Ok(stored.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<u64, StorageError> {
        let mut inner = self.write()?;
        if inner.users.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        let before = inner.posts.len();
        inner.posts.retain(|_, p| p.user_id != id);
        Ok((before - inner.posts.len()) as u64)
    }

    // --- Posts ---------------------------------------------------------------

    async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let mut inner = self.write()?;
        if !inner.users.contains_key(&post.user_id) {
            return Err(StorageError::UnknownUser(post.user_id));
        }
        inner.last_post_id += 1;
        let id = inner.last_post_id;
        inner.posts.insert(
            id,
            Post {
                id,
                title: post.title.clone(),
                description: post.description.clone(),
                user_id: post.user_id,
                user: None,
            },
        );
        inner
            .joined_post(id)
            .ok_or_else(|| StorageError::Internal(format!("post {id} missing after insert")))
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        let inner = self.read()?;
        Ok(inner.posts.values().map(|p| inner.with_owner(p)).collect())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, StorageError> {
        Ok(self.read()?.joined_post(id))
    }

    async fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, StorageError> {
        let inner = self.read()?;
        Ok(inner
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| inner.with_owner(p))
            .collect())
    }

    async fn save_post(&self, post: &Post) -> Result<Post, StorageError> {
        let mut inner = self.write()?;
        // A missing post wins over a missing owner, as in SQLite.
        if !inner.posts.contains_key(&post.id) {
            return Err(StorageError::NotFound);
        }
        if !inner.users.contains_key(&post.user_id) {
            return Err(StorageError::UnknownUser(post.user_id));
        }
        let stored = inner.posts.get_mut(&post.id).ok_or(StorageError::NotFound)?;
        stored.title = post.title.clone();
        stored.description = post.description.clone();
        stored.user_id = post.user_id;
        inner.joined_post(post.id).ok_or(StorageError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), StorageError> {
        let mut inner = self.write()?;
        inner
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[tokio::test]
    async fn user_roundtrip() {
        contract::user_roundtrip(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        contract::ids_are_never_reused(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn save_user_keeps_email() {
        contract::save_user_keeps_email(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        contract::missing_rows_report_not_found(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn posts_embed_their_owner() {
        contract::posts_embed_their_owner(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected() {
        contract::unknown_owner_is_rejected(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn delete_user_cascades_to_posts() {
        contract::delete_user_cascades_to_posts(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn reassigning_a_post_moves_it() {
        contract::reassigning_a_post_moves_it(&MemoryStorage::new()).await;
    }
}
