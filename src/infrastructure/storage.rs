use crate::infrastructure::error::InfraError;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Scoped JSON blob storage. Keys are `{collection}:{scope}` strings such as
/// `tasks:local` or `settings:usr-42`.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, InfraError>;
    fn write(&self, key: &str, value: &str) -> Result<(), InfraError>;
    fn remove(&self, key: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db_path: PathBuf,
}

impl SqliteKeyValueStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, InfraError> {
        let connection = self.connect()?;
        let value = connection
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, InfraError> {
        let entries = self
            .entries
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("kv lock poisoned: {error}")))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("kv lock poisoned: {error}")))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), InfraError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("kv lock poisoned: {error}")))?;
        entries.remove(key);
        Ok(())
    }
}
