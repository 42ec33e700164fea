//! SQLite-backed storage implementation.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! Created by [`migrations`](super::migrations), never implicitly:
//!
//! - `users`: one row per user; `AUTOINCREMENT` so ids are never reused.
//! - `posts`: `user_id REFERENCES users(id) ON DELETE CASCADE`. Foreign keys
//!   are switched on for every connection, so the store itself rejects a post
//!   whose owner has gone and removes a user's posts with the user.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use postboard::{NewPost, NewUser, Post, User};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{migrations, Storage, StorageError};

const USER_SELECT: &str = "SELECT id, first_name, last_name, email FROM users";

const POST_SELECT: &str = "
SELECT p.id, p.title, p.description, p.user_id,
       u.id, u.first_name, u.last_name, u.email
FROM posts p
JOIN users u ON u.id = p.user_id";

// ---------------------------------------------------------------------------
// SqliteStorage
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`Storage`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the SQLite database at `path`.
    ///
    /// The schema is not touched; call [`migrate`](Self::migrate) before
    /// serving requests.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        Self::configure(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Apply pending schema migrations and return the resulting version.
    pub fn migrate(&self) -> Result<u32, StorageError> {
        let mut conn = lock(&self.conn)?;
        migrations::migrate(&mut conn).map_err(|e| StorageError::Internal(e.to_string()))
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Row mapping and error conversions
// ---------------------------------------------------------------------------

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StorageError> {
    conn.lock()
        .map_err(|_| StorageError::Internal("connection mutex poisoned".into()))
}

fn map_err(e: rusqlite::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

/// Map a write error, turning a foreign key violation into
/// [`StorageError::UnknownUser`].
fn map_write_err(user_id: i64) -> impl Fn(rusqlite::Error) -> StorageError {
    move |e| match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            StorageError::UnknownUser(user_id)
        }
        _ => map_err(e),
    }
}

/// Read a user from `row`, starting at column `offset`.
fn user_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(offset)?,
        first_name: row.get(offset + 1)?,
        last_name: row.get(offset + 2)?,
        email: row.get(offset + 3)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    user_at(row, 0)
}

/// Read a [`POST_SELECT`] row.
fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        user_id: row.get(3)?,
        user: Some(user_at(row, 4)?),
    })
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<User>, StorageError> {
    conn.query_row(&format!("{USER_SELECT} WHERE id = ?1"), params![id], user_from_row)
        .optional()
        .map_err(map_err)
}

fn query_post(conn: &Connection, id: i64) -> Result<Option<Post>, StorageError> {
    conn.query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), params![id], post_from_row)
        .optional()
        .map_err(map_err)
}

fn query_posts(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Post>, StorageError> {
    let mut stmt = conn
        .prepare(&format!("{POST_SELECT} {filter} ORDER BY p.id"))
        .map_err(map_err)?;
    let rows = stmt.query_map(params, post_from_row).map_err(map_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for SqliteStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let user = user.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO users (first_name, last_name, email) VALUES (?1, ?2, ?3)",
                params![user.first_name, user.last_name, user.email],
            )
            .map_err(map_err)?;
            Ok(User {
                id: conn.last_insert_rowid(),
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
            })
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare(&format!("{USER_SELECT} ORDER BY id"))
                .map_err(map_err)?;
            let rows = stmt.query_map([], user_from_row).map_err(map_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(map_err)
        })
        .await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        self.run(move |conn| query_user(conn, id)).await
    }

    async fn save_user(&self, user: &User) -> Result<User, StorageError> {
        let user = user.clone();
        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET first_name = ?1, last_name = ?2 WHERE id = ?3",
                    params![user.first_name, user.last_name, user.id],
                )
                .map_err(map_err)?;
            if changed == 0 {
                return Err(StorageError::NotFound);
            }
            query_user(conn, user.id)?.ok_or(StorageError::NotFound)
        })
        .await
    }

    async fn delete_user(&self, id: i64) -> Result<u64, StorageError> {
        self.run(move |conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let posts: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM posts WHERE user_id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .map_err(map_err)?;
            // ON DELETE CASCADE removes the posts.
            let deleted = tx
                .execute("DELETE FROM users WHERE id = ?1", params![id])
                .map_err(map_err)?;
            if deleted == 0 {
                return Err(StorageError::NotFound);
            }
            tx.commit().map_err(map_err)?;
            u64::try_from(posts).map_err(|e| StorageError::Internal(e.to_string()))
        })
        .await
    }

    // --- Posts ---------------------------------------------------------------

    async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let post = post.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO posts (title, description, user_id) VALUES (?1, ?2, ?3)",
                params![post.title, post.description, post.user_id],
            )
            .map_err(map_write_err(post.user_id))?;
            let id = conn.last_insert_rowid();
            query_post(conn, id)?
                .ok_or_else(|| StorageError::Internal(format!("post {id} missing after insert")))
        })
        .await
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        self.run(|conn| query_posts(conn, "", params![])).await
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, StorageError> {
        self.run(move |conn| query_post(conn, id)).await
    }

    async fn list_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, StorageError> {
        self.run(move |conn| query_posts(conn, "WHERE p.user_id = ?1", params![user_id]))
            .await
    }

    async fn save_post(&self, post: &Post) -> Result<Post, StorageError> {
        let post = post.clone();
        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE posts SET title = ?1, description = ?2, user_id = ?3 WHERE id = ?4",
                    params![post.title, post.description, post.user_id, post.id],
                )
                .map_err(map_write_err(post.user_id))?;
            if changed == 0 {
                return Err(StorageError::NotFound);
            }
            query_post(conn, post.id)?.ok_or(StorageError::NotFound)
        })
        .await
    }

    async fn delete_post(&self, id: i64) -> Result<(), StorageError> {
        self.run(move |conn| {
            let deleted = conn
                .execute("DELETE FROM posts WHERE id = ?1", params![id])
                .map_err(map_err)?;
            if deleted == 0 {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    fn storage() -> SqliteStorage {
        let s = SqliteStorage::open_in_memory().unwrap();
        s.migrate().unwrap();
        s
    }

    #[tokio::test]
    async fn user_roundtrip() {
        contract::user_roundtrip(&storage()).await;
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        contract::ids_are_never_reused(&storage()).await;
    }

    #[tokio::test]
    async fn save_user_keeps_email() {
        contract::save_user_keeps_email(&storage()).await;
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        contract::missing_rows_report_not_found(&storage()).await;
    }

    #[tokio::test]
    async fn posts_embed_their_owner() {
        contract::posts_embed_their_owner(&storage()).await;
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected() {
        contract::unknown_owner_is_rejected(&storage()).await;
    }

    #[tokio::test]
    async fn delete_user_cascades_to_posts() {
        contract::delete_user_cascades_to_posts(&storage()).await;
    }

    #[tokio::test]
    async fn reassigning_a_post_moves_it() {
        contract::reassigning_a_post_moves_it(&storage()).await;
    }

    #[tokio::test]
    async fn unmigrated_database_is_an_internal_error() {
        let s = SqliteStorage::open_in_memory().unwrap();
        let err = s.list_users().await.unwrap_err();
        assert!(matches!(err, StorageError::Internal(_)));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postboard.db");
        let path = path.to_str().unwrap();

        let id = {
            let s = SqliteStorage::open(path).unwrap();
            s.migrate().unwrap();
            contract::new_user(&s, "a@b.com").await.id
        };

        let s = SqliteStorage::open(path).unwrap();
        assert_eq!(s.migrate().unwrap(), migrations::latest_version());
        let got = s.get_user(id).await.unwrap().unwrap();
        assert_eq!(got.email, "a@b.com");
    }
}
