//! `postboard-server`, the Users/Posts REST API.
//!
//! # Quick start
//!
//! ```sh
//! # SQLite file test_db.db on the default port:
//! postboard-server
//!
//! # In-memory store on port 8080:
//! DB_NAME=:memory: PORT=8080 postboard-server
//!
//! # Wait for a sibling database container before opening the store:
//! STARTUP_DELAY_SECS=5 DB_NAME=blog postboard-server
//! ```
//!
//! # Environment variables
//!
//! See [`postboard_server::ServerConfig`] for the full list.

use std::process::ExitCode;
use std::time::Duration;

use postboard_server::{build_router, storage, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postboard_server=info,tower_http=debug".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.startup_delay_secs > 0 {
        tracing::info!(
            "waiting {}s before connecting to the database",
            config.startup_delay_secs
        );
        tokio::time::sleep(Duration::from_secs(config.startup_delay_secs)).await;
    }

    let storage = match storage::open(&config.database) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("unable to connect to the database: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("database connection has been established successfully");

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {e}", config.bind_addr);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("listening on {}", config.bind_addr);

    if let Err(e) = axum::serve(listener, build_router(storage)).await {
        tracing::error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
