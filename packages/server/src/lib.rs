//! Public surface for the `postboard-server` crate.
//!
//! Exposes the router builder, config, and storage types so that external
//! crates (e.g. the conformance test suite) can spin up an in-process server
//! without spawning a subprocess.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod storage;

pub use config::{ConfigError, DatabaseConfig, ServerConfig};
pub use error::AppError;
pub use router::build_router;
pub use storage::{memory::MemoryStorage, sqlite::SqliteStorage, Storage, StorageError};
