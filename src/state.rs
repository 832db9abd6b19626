//! State Management - SQLite-based persistence for local documents
//!
//! This module provides durable key-value storage for the two documents that
//! survive a restart:
//! - The favorites collection
//! - The UI selection scratchpad
//!
//! Each document is stored as one JSON value under its key. Saving is an
//! upsert, so writing the same value twice leaves the same durable state.
//! The database is stored in XDG_DATA_HOME/commitmark/state.db

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Document key of the favorites collection
pub const FAVORITES_KEY: &str = "favorites";

/// Document key of the UI selection map
pub const UI_SELECTIONS_KEY: &str = "ui";

/// Durable key-value storage of JSON documents
pub trait DocumentStore: Send + Sync {
    /// Load the document stored under `key`, `None` if it was never saved
    fn load_document(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the document stored under `key`
    fn save_document(&self, key: &str, value: &Value) -> Result<()>;

    /// Remove the document stored under `key`, if any
    fn delete_document(&self, key: &str) -> Result<()>;
}

/// Load and deserialize a typed document
pub fn load_typed<T: DeserializeOwned>(store: &dyn DocumentStore, key: &str) -> Result<Option<T>> {
    match store.load_document(key)? {
        Some(value) => {
            let typed = serde_json::from_value(value)
                .with_context(|| format!("Failed to decode stored document '{}'", key))?;
            Ok(Some(typed))
        }
        None => Ok(None),
    }
}

/// Serialize and save a typed document
pub fn save_typed<T: Serialize + ?Sized>(store: &dyn DocumentStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .with_context(|| format!("Failed to encode document '{}'", key))?;
    store.save_document(key, &value)
}

/// State database manager
pub struct StateDb {
    conn: Mutex<Connection>,
}

impl StateDb {
    /// Open or create the state database at a specific path
    pub fn open_at(path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        info!("State database opened at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Each statement is atomic, so a poisoned lock still guards a consistent connection
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS documents (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
            )
            .context("Failed to initialize database schema")?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Keys of all stored documents
    pub fn document_keys(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM documents ORDER BY key")?;

        let keys = stmt
            .query_map([], |row| row.get(0))
            .context("Failed to query document keys")?
            .collect::<Result<Vec<String>, _>>()
            .context("Failed to collect document keys")?;

        Ok(keys)
    }
}

impl DocumentStore for StateDb {
    fn load_document(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to query document '{}'", key))?;

        match raw {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Stored document '{}' is not valid JSON", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn save_document(&self, key: &str, value: &Value) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let raw = serde_json::to_string(value).context("Failed to serialize document")?;

        self.conn()
            .execute(
                r#"
                INSERT INTO documents (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = ?2,
                    updated_at = ?3
                "#,
                params![key, raw, now],
            )
            .with_context(|| format!("Failed to save document '{}'", key))?;

        debug!("Saved document '{}' ({} bytes)", key, raw.len());
        Ok(())
    }

    fn delete_document(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM documents WHERE key = ?1", params![key])
            .with_context(|| format!("Failed to delete document '{}'", key))?;
        Ok(())
    }
}
