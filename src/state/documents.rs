use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::StoreError;

/// A stored document's fields
pub type Document = Map<String, Value>;

/// A document together with its store-assigned key
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

/// Minimal document-collection interface the gallery needs:
/// enumerate, insert, delete by id. No queries beyond full enumeration.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection`, in the backend's natural order
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    /// Insert a document and return its newly assigned id
    async fn insert(&self, collection: &str, fields: Document) -> Result<String, StoreError>;

    /// Delete by id; a missing id is `StoreError::NotFound`
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Document store kept in a local SQLite file.
///
/// The database file is created in the user's data directory by default:
/// - Linux: ~/.local/share/apod-gallery/gallery.db
/// - macOS: ~/Library/Application Support/apod-gallery/gallery.db
/// - Windows: %APPDATA%\apod-gallery\gallery.db
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(db_path)?;
        info!("📁 Gallery database at: {}", db_path.display());

        Self::with_connection(conn, Some(db_path.to_path_buf()))
    }

    /// Private, throwaway database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    /// Path of the database file (None when in memory)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run blocking SQLite work on the runtime's blocking pool
    async fn run<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("database lock poisoned".into()))?;
            work(&*guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("task join error: {}", e)))?
    }
}

/// Create the documents table and its index if they don't exist
fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            seq             INTEGER PRIMARY KEY AUTOINCREMENT,
            id              TEXT NOT NULL UNIQUE,
            collection      TEXT NOT NULL,
            body            TEXT NOT NULL,
            created_at      INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection
         ON documents(collection, seq)",
        [],
    )?;

    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let collection = collection.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq",
            )?;

            let rows = stmt.query_map([&collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut documents = Vec::new();
            for row in rows {
                let (id, body) = row?;
                let fields: Document = serde_json::from_str(&body)?;
                documents.push(StoredDocument { id, fields });
            }
            Ok(documents)
        })
        .await
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<String, StoreError> {
        let collection = collection.to_string();
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = serde_json::to_string(&fields)?;

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO documents (id, collection, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![&id, &collection, &body, chrono::Utc::now().timestamp()],
            )?;
            Ok(id)
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.run(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![&collection, &id],
            )?;
            if deleted == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

impl std::fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDocumentStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
