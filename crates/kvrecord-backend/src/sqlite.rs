//! SQLite implementation of the Backend trait.
//!
//! A durable local key/value backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{BackendError, Result};
use crate::migration;
use crate::traits::{Backend, CasOutcome};

/// SQLite-based backend.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. The mutex serializes writes, so
/// per-key write ordering holds.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening sqlite backend");
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| BackendError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| BackendError::Task(e.to_string()))?
    }
}

fn get_value(conn: &Connection, key: &str) -> Result<Bytes> {
    let value: Option<Vec<u8>> = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value.map(Bytes::from).unwrap_or_default())
}

fn put_value(conn: &Connection, key: &str, value: &[u8]) -> Result<()> {
    if value.is_empty() {
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    } else {
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_millis()],
        )?;
    }
    Ok(())
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn read(&self, key: &str) -> Result<Bytes> {
        let key = key.to_string();
        self.with_conn(move |conn| get_value(conn, &key)).await
    }

    async fn write(&self, key: &str, value: Bytes) -> Result<()> {
        let key = key.to_string();
        self.with_conn(move |conn| put_value(conn, &key, &value)).await
    }

    fn supports_compare_and_swap(&self) -> bool {
        true
    }

    async fn compare_and_swap(&self, key: &str, expected: Bytes, new: Bytes) -> Result<CasOutcome> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let current = get_value(&tx, &key)?;
            if current != expected {
                return Ok(CasOutcome::Mismatch { current });
            }
            put_value(&tx, &key, &new)?;
            tx.commit()?;
            Ok(CasOutcome::Swapped)
        })
        .await
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(keys)
        })
        .await
    }

    async fn is_available(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(one == 1)
        })
        .await
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_write() {
        let backend = SqliteBackend::open_memory().unwrap();

        assert!(backend.read("a").await.unwrap().is_empty());

        backend.write("a", Bytes::from_static(b"one")).await.unwrap();
        backend.write("a", Bytes::from_static(b"two")).await.unwrap();
        assert_eq!(backend.read("a").await.unwrap(), Bytes::from_static(b"two"));

        backend.write("a", Bytes::new()).await.unwrap();
        assert!(backend.read("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let backend = SqliteBackend::open_memory().unwrap();

        let swapped = backend
            .compare_and_swap("idx", Bytes::new(), Bytes::from_static(b"[1]"))
            .await
            .unwrap();
        assert_eq!(swapped, CasOutcome::Swapped);

        let stale = backend
            .compare_and_swap("idx", Bytes::new(), Bytes::from_static(b"[2]"))
            .await
            .unwrap();
        assert_eq!(
            stale,
            CasOutcome::Mismatch {
                current: Bytes::from_static(b"[1]")
            }
        );
        assert_eq!(backend.read("idx").await.unwrap(), Bytes::from_static(b"[1]"));
    }

    #[tokio::test]
    async fn test_scan_keys_handles_like_metacharacters() {
        let backend = SqliteBackend::open_memory().unwrap();
        for key in ["rec_%1", "rec_a", "recXa", "other"] {
            backend.write(key, Bytes::from_static(b"x")).await.unwrap();
        }

        let keys = backend.scan_keys("rec_").await.unwrap();
        assert_eq!(keys, vec!["rec_%1".to_string(), "rec_a".to_string()]);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.write("k", Bytes::from_static(b"v")).await.unwrap();
        }

        let backend = SqliteBackend::open(&path).unwrap();
        assert!(backend.is_available().await.unwrap());
        assert_eq!(backend.read("k").await.unwrap(), Bytes::from_static(b"v"));
    }
}
