pub mod models;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::{Path, PathBuf};

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_users",
    include_str!("../../migrations/001_users.sql"),
)];

/// Turn a `DATABASE_URL` into a filesystem path. Accepts a bare path or a
/// `sqlite://` / `sqlite:` prefixed one.
pub fn database_path(url: &str) -> PathBuf {
    let trimmed = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(trimmed)
}

pub fn create_pool(db_path: &Path, max_size: u32) -> anyhow::Result<DbPool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            ",
        )
    });
    let pool = Pool::builder().max_size(max_size.max(1)).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool(dir: &tempfile::TempDir) -> DbPool {
        create_pool(&dir.path().join("test.db"), 2).unwrap()
    }

    #[test]
    fn database_path_strips_scheme() {
        assert_eq!(database_path("sqlite://data/site.db"), PathBuf::from("data/site.db"));
        assert_eq!(database_path("sqlite:site.db"), PathBuf::from("site.db"));
        assert_eq!(database_path("/var/site.db"), PathBuf::from("/var/site.db"));
    }

    #[test]
    fn create_pool_creates_db_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("sub/dir/test.db");
        let pool = create_pool(&db_path, 4).unwrap();
        assert!(db_path.exists());
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn migrations_are_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = test_pool(&tmp);
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn users_email_is_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = test_pool(&tmp);
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let insert = "INSERT INTO users (id, email, password_hash, name) VALUES (?1, ?2, 'h', 'n')";
        conn.execute(insert, params!["u1", "a@b.com"]).unwrap();
        assert!(conn.execute(insert, params!["u2", "a@b.com"]).is_err());
    }

    #[test]
    fn users_role_is_constrained() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = test_pool(&tmp);
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let result = conn.execute(
            "INSERT INTO users (id, email, password_hash, name, role) VALUES ('u1', 'a@b.com', 'h', 'n', 'owner')",
            [],
        );
        assert!(result.is_err());
    }
}
