//! SQLite document store backend
//!
//! Stores schemaless documents as JSON text, one table per collection with
//! the stringified record identifier as primary key. A unique index on the
//! extracted `link` field makes the `get_or_create` race surface as a
//! duplicate-key write failure instead of silent duplicate records.

use crate::store::backend::{Document, StoreBackend, StoreError, StoreResult};
use crate::store::codec::PRIMARY_KEY;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed document store
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Opens (or creates) a document store database at the given path
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory document store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection mutex poisoned".to_string()))
    }

    /// Creates the collection's table and link index on first touch
    fn ensure_collection(conn: &Connection, collection: &str) -> StoreResult<()> {
        validate_collection_name(collection)?;
        conn.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS \"{collection}\" (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS \"{collection}_link\"
                ON \"{collection}\" (json_extract(doc, '$.link'));
        ",
        ))?;
        Ok(())
    }

    fn insert_locked(conn: &Connection, collection: &str, doc: &Document) -> StoreResult<()> {
        let id = doc
            .get(PRIMARY_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StoreError::MalformedRecord(format!("document has no {PRIMARY_KEY} field"))
            })?;
        let body = serde_json::to_string(doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            &format!("INSERT INTO \"{collection}\" (id, doc) VALUES (?1, ?2)"),
            params![id, body],
        )?;
        Ok(())
    }
}

impl StoreBackend for SqliteBackend {
    fn insert_one(&self, collection: &str, doc: &Document) -> StoreResult<()> {
        let conn = self.lock()?;
        Self::ensure_collection(&conn, collection)?;
        Self::insert_locked(&conn, collection, doc)
    }

    fn insert_many(&self, collection: &str, docs: &[Document]) -> StoreResult<()> {
        let conn = self.lock()?;
        Self::ensure_collection(&conn, collection)?;
        // No multi-document transaction: the first rejected document aborts
        // the batch with no guarantee about the already-written prefix.
        for doc in docs {
            Self::insert_locked(&conn, collection, doc)?;
        }
        Ok(())
    }

    fn find_one(&self, collection: &str, filter: &Document) -> StoreResult<Option<Document>> {
        let conn = self.lock()?;
        Self::ensure_collection(&conn, collection)?;

        let mut stmt = conn.prepare(&format!("SELECT doc FROM \"{collection}\""))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let doc = parse_row(row.get::<_, String>(0)?)?;
            if matches_filter(&doc, filter) {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>> {
        let conn = self.lock()?;
        Self::ensure_collection(&conn, collection)?;

        let mut stmt = conn.prepare(&format!("SELECT doc FROM \"{collection}\""))?;
        let mut rows = stmt.query([])?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next()? {
            let doc = parse_row(row.get::<_, String>(0)?)?;
            if matches_filter(&doc, filter) {
                matches.push(doc);
            }
        }
        Ok(matches)
    }
}

fn parse_row(body: String) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Backend("row is not a JSON object".to_string())),
        Err(e) => Err(StoreError::Backend(e.to_string())),
    }
}

/// Field-equality match over a parsed document
fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, value)| doc.get(key) == Some(value))
}

/// Collection names are interpolated into SQL; restrict them to safe
/// identifier characters.
fn validate_collection_name(collection: &str) -> StoreResult<()> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::Backend(format!(
            "invalid collection name: {collection:?}"
        )))
    }
}
