//! SQLite-backed key-value store

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::KeyValueStore;
use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// How long a connection waits for another writer's lock
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Key-value store in a single `kv_store` table
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl SqliteStore {
    /// Open (or create) a database file
    ///
    /// Several processes may share the file; writers wait on each other for
    /// up to [`BUSY_TIMEOUT_MS`] instead of failing immediately.
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;
            Ok(())
        });
        let pool = Pool::builder().max_size(4).build(manager)?;

        let store = Self {
            pool,
            db_path: path.to_string(),
        };
        store.run_migrations()?;

        debug!(path, "Opened key-value store");
        Ok(store)
    }

    /// Private in-memory database
    ///
    /// The pool is capped at one connection: every `:memory:` connection is a
    /// separate database.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;

        let store = Self {
            pool,
            db_path: ":memory:".to_string(),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        select_value(&conn, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        upsert(&conn, key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let mut conn = self.conn()?;

        // IMMEDIATE takes the write lock before the read
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = select_value(&tx, key)?;
        let value = apply(current)?;
        upsert(&tx, key, &value)?;
        tx.commit()?;
        Ok(())
    }
}

fn select_value(conn: &rusqlite::Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn upsert(conn: &rusqlite::Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
        [key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_empty().unwrap());

        store.set("budget", r#"{"monthly":100}"#).unwrap();
        store.set("budget", r#"{"monthly":200}"#).unwrap();
        assert_eq!(
            store.get("budget").unwrap().as_deref(),
            Some(r#"{"monthly":200}"#)
        );
        assert_eq!(store.len().unwrap(), 1);

        store.remove("budget").unwrap();
        assert_eq!(store.get("budget").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paisa.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::open(path).unwrap();
            store.set("detection_consent", "true").unwrap();
        }

        let reopened = SqliteStore::open(path).unwrap();
        assert_eq!(
            reopened.get("detection_consent").unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(reopened.path(), path);
    }
}
