//! Versioned schema migrations for the SQLite store.
//!
//! The applied version is kept in SQLite's `PRAGMA user_version`. Each
//! migration newer than that runs in its own transaction, which also bumps
//! `user_version`, so a failed step leaves the database at the previous
//! version. Migrations are append-only: never edit a released entry.

use rusqlite::Connection;

/// One schema step.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All known migrations, in ascending `version` order starting at 1.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create users and posts",
    sql: "
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    email       TEXT NOT NULL
);

CREATE TABLE posts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX idx_posts_user_id ON posts(user_id);
",
}];

/// Errors from [`migrate`].
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("database schema version {found} is newer than the latest known version {latest}")]
    UnknownVersion { found: u32, latest: u32 },

    #[error("migration {version} ({description}) failed: {source}")]
    Failed {
        version: u32,
        description: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// The version a fully migrated database reports.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Read the applied schema version.
pub fn current_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Apply every migration newer than the database's version and return the
/// resulting version.
pub fn migrate(conn: &mut Connection) -> Result<u32, MigrationError> {
    let found = current_version(conn)?;
    let latest = latest_version();
    if found > latest {
        return Err(MigrationError::UnknownVersion { found, latest });
    }

    for m in MIGRATIONS.iter().filter(|m| m.version > found) {
        let failed = |source| MigrationError::Failed {
            version: m.version,
            description: m.description,
            source,
        };
        let tx = conn.transaction().map_err(failed)?;
        tx.execute_batch(m.sql).map_err(failed)?;
        // PRAGMA does not take bound parameters; the version is a trusted constant.
        tx.execute_batch(&format!("PRAGMA user_version = {}", m.version))
            .map_err(failed)?;
        tx.commit().map_err(failed)?;
        tracing::info!("applied migration {}: {}", m.version, m.description);
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_contiguous_from_one() {
        for (i, m) in MIGRATIONS.iter().enumerate() {
            assert_eq!(m.version as usize, i + 1, "migration {} out of order", m.description);
        }
    }

    #[test]
    fn fresh_database_migrates_to_latest() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
        assert_eq!(migrate(&mut conn).unwrap(), latest_version());
        assert_eq!(current_version(&conn).unwrap(), latest_version());

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'posts')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        // A second run finds nothing to do and must not re-create tables.
        assert_eq!(migrate(&mut conn).unwrap(), latest_version());
    }

    #[test]
    fn newer_database_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 999").unwrap();
        let err = migrate(&mut conn).unwrap_err();
        assert!(matches!(err, MigrationError::UnknownVersion { found: 999, .. }));
    }
}
