//! Shared helpers for the Postboard conformance test suite.
//!
//! Provides [`spawn_server`] and [`spawn_sqlite_server`], which bind a
//! `TcpListener` on an ephemeral port and serve the real router from a
//! background task. Tests talk to the returned base URL over HTTP.

use std::sync::Arc;

use postboard_server::{build_router, MemoryStorage, SqliteStorage, Storage};

/// Start an ephemeral in-process server backed by [`MemoryStorage`] and
/// return its base URL, e.g. `http://127.0.0.1:51234`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub async fn spawn_server() -> String {
    spawn_server_with(Arc::new(MemoryStorage::new())).await
}

/// Start an ephemeral server backed by a fully migrated in-memory SQLite
/// database, so the suite also covers the SQL paths (foreign keys, cascade,
/// `AUTOINCREMENT`).
///
/// # Panics
///
/// Panics if the database cannot be opened or migrated.
pub async fn spawn_sqlite_server() -> String {
    let storage = SqliteStorage::open_in_memory().expect("open in-memory SQLite");
    storage.migrate().expect("migrate in-memory SQLite");
    spawn_server_with(Arc::new(storage)).await
}

/// Start an ephemeral server over an arbitrary store.
pub async fn spawn_server_with(storage: Arc<dyn Storage>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");

    let router = build_router(storage);
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance server error");
    });

    format!("http://{addr}")
}
