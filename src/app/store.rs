// src/app/store.rs
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::error::StoreError;

/// String key/value persistence, partitioned by scope (one scope per media kind).
pub trait KeyValueStore: Send {
    fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, scope: &str, key: &str, value: &str) -> Result<(), StoreError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
  scope      TEXT    NOT NULL,
  key        TEXT    NOT NULL,
  value      TEXT    NOT NULL,
  updated_at INTEGER NOT NULL,
  PRIMARY KEY (scope, key)
)
"#;

/// SQLite-backed store. Each `set` is one upsert statement, so writes are
/// atomic per key and the last write wins.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        info!("Opened store {}", path.display());
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Every row, optionally limited to one scope, ordered by scope then key.
    pub fn entries(&self, scope: Option<&str>) -> Result<Vec<StoreEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT scope, key, value, updated_at FROM kv
             WHERE ?1 IS NULL OR scope = ?1
             ORDER BY scope, key",
        )?;
        let rows = stmt.query_map(params![scope], |row| {
            Ok(StoreEntry {
                scope: row.get(0)?,
                key: row.get(1)?,
                value: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreEntry {
    pub scope: String,
    pub key: String,
    pub value: String,
    /// Unix seconds of the last write.
    pub updated_at: i64,
}

impl KeyValueStore for SqliteStore {
    fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE scope = ?1 AND key = ?2",
                params![scope, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, scope: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO kv (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(scope, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![scope, key, value, now],
        )?;
        Ok(())
    }
}

/// Volatile store; used by tests and when the database cannot be opened.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<(String, String), String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .values
            .get(&(scope.to_string(), key.to_string()))
            .cloned())
    }

    fn set(&mut self, scope: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .insert((scope.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &mut dyn KeyValueStore) {
        assert_eq!(store.get("movie", "favorites").unwrap(), None);
        store.set("movie", "favorites", "[1]").unwrap();
        store.set("movie", "favorites", "[1,2]").unwrap();
        store.set("tv", "favorites", "[9]").unwrap();
        assert_eq!(
            store.get("movie", "favorites").unwrap().as_deref(),
            Some("[1,2]")
        );
        assert_eq!(store.get("tv", "favorites").unwrap().as_deref(), Some("[9]"));
    }

    #[test]
    fn memory_store_scopes_keys() {
        exercise(&mut MemoryStore::default());
    }

    #[test]
    fn sqlite_store_scopes_keys() {
        exercise(&mut SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn entries_lists_rows_by_scope() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("tv", "favorites", "[9]").unwrap();
        store.set("movie", "ratings", "{}").unwrap();
        store.set("movie", "favorites", "[1]").unwrap();

        let all = store.entries(None).unwrap();
        let keys: Vec<(&str, &str)> = all
            .iter()
            .map(|e| (e.scope.as_str(), e.key.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("movie", "favorites"), ("movie", "ratings"), ("tv", "favorites")]
        );
        assert!(all.iter().all(|e| e.updated_at > 0));

        let tv = store.entries(Some("tv")).unwrap();
        assert_eq!(tv.len(), 1);
        assert_eq!(tv[0].value, "[9]");
    }

    #[test]
    fn sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("movie", "ratings", r#"{"12":3.5}"#).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("movie", "ratings").unwrap().as_deref(),
            Some(r#"{"12":3.5}"#)
        );
    }
}
