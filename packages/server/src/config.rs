//! Server configuration, populated from environment variables.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// The `DB_NAME` value that selects the in-memory store.
pub const IN_MEMORY_DB_NAME: &str = ":memory:";

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{var} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Runtime configuration for the server.
///
/// All fields are populated from environment variables with defaults, so the
/// server starts with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `PORT` | `3000` | HTTP listen port on `0.0.0.0` |
/// | `DB_HOST` | `localhost` | Database host (startup log only) |
/// | `DB_PORT` | `3306` | Database port (startup log only) |
/// | `DB_USER` | `root` | Database user (startup log only) |
/// | `DB_PASSWORD` | `password` | Database password (never logged) |
/// | `DB_NAME` | `test_db` | SQLite file `<DB_NAME>.db` (`:memory:` = in-memory store) |
/// | `STARTUP_DELAY_SECS` | `0` | Seconds to wait before opening the database |
///
/// The store is embedded SQLite, so only `DB_NAME` decides what is opened.
/// The other `DB_*` values are reported at startup and otherwise unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: SocketAddr,

    pub database: DatabaseConfig,

    /// Delay before the database is opened, for deployments where the
    /// database container starts alongside the server.
    pub startup_delay_secs: u64,
}

/// Connection settings for the relational store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl DatabaseConfig {
    /// `true` when `DB_NAME` selects the in-memory store.
    pub fn is_in_memory(&self) -> bool {
        self.name == IN_MEMORY_DB_NAME
    }

    /// Path of the SQLite database file backing `name`.
    pub fn sqlite_path(&self) -> String {
        format!("{}.db", self.name)
    }
}

/// Never prints the password.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// `user@host:port/name`, for startup logs.
impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}

impl ServerConfig {
    /// Populate config from the process environment, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Populate config from an arbitrary key lookup. `from_env` is this with
    /// `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port: u16 = parse_var(&lookup, "PORT", 3000, "a TCP port number (0-65535)")?;

        Ok(Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            database: DatabaseConfig {
                host: text("DB_HOST", "localhost"),
                port: parse_var(&lookup, "DB_PORT", 3306, "a TCP port number (0-65535)")?,
                user: text("DB_USER", "root"),
                password: text("DB_PASSWORD", "password"),
                name: text("DB_NAME", "test_db"),
            },
            startup_delay_secs: parse_var(
                &lookup,
                "STARTUP_DELAY_SECS",
                0,
                "a non-negative whole number of seconds",
            )?,
        })
    }
}

fn parse_var<F, T>(
    lookup: &F,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            expected,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(cfg.database.host, "localhost");
        assert_eq!(cfg.database.port, 3306);
        assert_eq!(cfg.database.user, "root");
        assert_eq!(cfg.database.password, "password");
        assert_eq!(cfg.database.name, "test_db");
        assert_eq!(cfg.startup_delay_secs, 0);
        assert_eq!(cfg.database.sqlite_path(), "test_db.db");
        assert!(!cfg.database.is_in_memory());
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config_from(&[
            ("PORT", "8080"),
            ("DB_HOST", "db"),
            ("DB_PORT", "5000"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", IN_MEMORY_DB_NAME),
            ("STARTUP_DELAY_SECS", "20"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.database.to_string(), "app@db:5000/:memory:");
        assert!(cfg.database.is_in_memory());
        assert_eq!(cfg.startup_delay_secs, 20);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "http")]).unwrap_err();
        assert_eq!(err.var, "PORT");
        assert_eq!(err.value, "http");

        let err = config_from(&[("DB_PORT", "70000")]).unwrap_err();
        assert_eq!(err.var, "DB_PORT");
    }

    #[test]
    fn only_db_name_selects_the_store() {
        let base = config_from(&[("DB_NAME", "blog")]).unwrap().database;
        let other = config_from(&[
            ("DB_NAME", "blog"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "5432"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "s3cret"),
        ])
        .unwrap()
        .database;
        assert_eq!(base.sqlite_path(), "blog.db");
        assert_eq!(other.sqlite_path(), base.sqlite_path());
        assert_eq!(other.is_in_memory(), base.is_in_memory());
    }

    #[test]
    fn debug_output_redacts_password() {
        let cfg = config_from(&[("DB_PASSWORD", "hunter2")]).unwrap();
        let debug = format!("{:?}", cfg.database);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
