//! patron-store — SQLite-backed identity persistence.
//!
//! Implements the `IdentityStore` contract from patron-core: full-gallery
//! load and append-only enrollment. Prototype embeddings are stored as JSON
//! arrays; a row that fails to decode is skipped with a warning rather than
//! failing the whole scan, so one corrupt record can never take the kiosk
//! down. The maintenance extras (`remove`, `wipe`, `count`) exist for the
//! `patron` CLI, not for the engine.

use patron_core::{Embedding, Identity, IdentityStore, StoreError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteStoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("prototype json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SqliteStoreError> for StoreError {
    fn from(e: SqliteStoreError) -> Self {
        match e {
            SqliteStoreError::Sqlite(inner) => StoreError::Backend(inner.to_string()),
            SqliteStoreError::Json(inner) => StoreError::Serialization(inner.to_string()),
        }
    }
}

/// SQLite identity store. The connection is serialized behind a mutex; the
/// engine runs on a single frame thread and the CLI is the only other
/// writer, so contention is not a concern.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteStoreError> {
        if let Some(dir) = path.as_ref().parent() {
            // Best-effort; open() reports the real failure if this didn't work.
            let _ = std::fs::create_dir_all(dir);
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store, used in tests.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SqliteStoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                prototype TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Number of enrolled identities, corrupt rows included.
    pub fn count(&self) -> Result<u64, SqliteStoreError> {
        let conn = self.lock();
        let n: u64 = conn.query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Delete one identity. Returns true when a row was removed.
    pub fn remove(&self, id: &str) -> Result<bool, SqliteStoreError> {
        let conn = self.lock();
        let n = conn.execute("DELETE FROM identities WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    /// Delete every enrolled identity.
    pub fn wipe(&self) -> Result<u64, SqliteStoreError> {
        let conn = self.lock();
        let n = conn.execute("DELETE FROM identities", [])?;
        Ok(n as u64)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned mutex means another thread panicked mid-statement;
        // the connection itself is still usable for our statement set.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl IdentityStore for SqliteStore {
    fn load_all(&self) -> Result<Vec<Identity>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, name, prototype, created_at FROM identities ORDER BY created_at")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut identities = Vec::new();
        for row in rows {
            let (id, name, prototype_json, created_at) = match row {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable identity row");
                    continue;
                }
            };

            let values: Vec<f32> = match serde_json::from_str(&prototype_json) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(%id, error = %e, "skipping identity with corrupt prototype");
                    continue;
                }
            };
            if values.is_empty() {
                tracing::warn!(%id, "skipping identity with empty prototype");
                continue;
            }

            identities.push(Identity {
                id,
                name,
                prototype: Embedding::new(values),
                created_at,
            });
        }

        Ok(identities)
    }

    fn append(&self, name: &str, prototype: &Embedding) -> Result<Identity, StoreError> {
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            prototype: prototype.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let prototype_json = serde_json::to_string(&identity.prototype.values)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let conn = self.lock();
        conn.execute(
            "INSERT INTO identities (id, name, prototype, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![identity.id, identity.name, prototype_json, identity.created_at],
        )
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        tracing::debug!(id = %identity.id, name = %identity.name, "identity persisted");
        Ok(identity)
    }
}

/// Database location: `$PATRON_DB_PATH`, or
/// `$XDG_DATA_HOME/patron/identities.db`, falling back to
/// `~/.local/share/patron/identities.db`.
pub fn default_db_path() -> PathBuf {
    if let Ok(p) = std::env::var("PATRON_DB_PATH") {
        return PathBuf::from(p);
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("patron")
        .join("identities.db")
}
