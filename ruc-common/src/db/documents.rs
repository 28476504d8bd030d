//! Document store
//!
//! Hierarchical JSON documents addressed by [`CollectionPath`] /
//! [`DocumentPath`], kept in the `documents` table. [`DocumentStore`] runs each
//! call on its own pooled connection; [`DocumentTx`] offers the same calls
//! inside one SQLite transaction that commits or rolls back as a unit.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use super::paths::{CollectionPath, DocumentPath};
use crate::{uuid_utils, Error, Result};

/// A stored document: its id within the collection plus its JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    fn from_row(id: String, data: &str) -> Result<Self> {
        match serde_json::from_str(data)? {
            Value::Object(data) => Ok(Self { id, data }),
            _ => Err(Error::Internal(format!("document {} body is not an object", id))),
        }
    }

    /// Deserialize the body, with the document id available as `id`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut data = self.data.clone();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

/// Serialize a document body; bodies must be JSON objects
fn encode_body<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(Value::Object(map).to_string()),
        other => Err(Error::Internal(format!(
            "document body must be a JSON object, got {}",
            other
        ))),
    }
}

async fn fetch_collection(
    conn: &mut SqliteConnection,
    path: &CollectionPath,
) -> Result<Vec<Document>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT doc_id, data FROM documents WHERE collection = ? ORDER BY rowid",
    )
    .bind(path.as_str())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(id, data)| Document::from_row(id, &data))
        .collect()
}

async fn fetch_where(
    conn: &mut SqliteConnection,
    path: &CollectionPath,
    field: &str,
    value: &str,
) -> Result<Vec<Document>> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::InvalidPath(format!("bad field name {:?}", field)));
    }

    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT doc_id, data FROM documents
        WHERE collection = ? AND json_extract(data, ?) = ?
        ORDER BY rowid
        "#,
    )
    .bind(path.as_str())
    .bind(format!("$.{}", field))
    .bind(value)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(id, data)| Document::from_row(id, &data))
        .collect()
}

async fn fetch_document(
    conn: &mut SqliteConnection,
    path: &DocumentPath,
) -> Result<Option<Document>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT data FROM documents WHERE collection = ? AND doc_id = ?")
            .bind(path.collection().as_str())
            .bind(path.id())
            .fetch_optional(&mut *conn)
            .await?;

    row.map(|(data,)| Document::from_row(path.id().to_string(), &data))
        .transpose()
}

async fn insert_document(
    conn: &mut SqliteConnection,
    path: &CollectionPath,
    body: String,
) -> Result<String> {
    let id = uuid_utils::document_id();
    sqlx::query("INSERT INTO documents (collection, doc_id, data) VALUES (?, ?, ?)")
        .bind(path.as_str())
        .bind(&id)
        .bind(body)
        .execute(&mut *conn)
        .await?;

    debug!("Created document {}/{}", path, id);
    Ok(id)
}

async fn upsert_document(conn: &mut SqliteConnection, path: &DocumentPath, body: String) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (collection, doc_id, data) VALUES (?, ?, ?)
        ON CONFLICT (collection, doc_id)
        DO UPDATE SET data = excluded.data, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(path.collection().as_str())
    .bind(path.id())
    .bind(body)
    .execute(&mut *conn)
    .await?;

    debug!("Set document {}", path);
    Ok(())
}

async fn patch_document(conn: &mut SqliteConnection, path: &DocumentPath, patch: String) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET data = json_patch(data, ?), updated_at = CURRENT_TIMESTAMP
        WHERE collection = ? AND doc_id = ?
        "#,
    )
    .bind(patch)
    .bind(path.collection().as_str())
    .bind(path.id())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(path.to_string()));
    }

    debug!("Updated document {}", path);
    Ok(())
}

async fn remove_document(conn: &mut SqliteConnection, path: &DocumentPath) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND doc_id = ?")
        .bind(path.collection().as_str())
        .bind(path.id())
        .execute(&mut *conn)
        .await?;

    debug!("Deleted document {}", path);
    Ok(result.rows_affected() > 0)
}

/// Document store over a SQLite pool
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All documents in a collection, oldest first
    pub async fn get_collection(&self, path: &CollectionPath) -> Result<Vec<Document>> {
        let mut conn = self.pool.acquire().await?;
        fetch_collection(&mut conn, path).await
    }

    /// Documents in a collection whose top-level string `field` equals `value`
    pub async fn query_collection(
        &self,
        path: &CollectionPath,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        let mut conn = self.pool.acquire().await?;
        fetch_where(&mut conn, path, field, value).await
    }

    /// One document, or `None` when absent
    pub async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let mut conn = self.pool.acquire().await?;
        fetch_document(&mut conn, path).await
    }

    /// Store a new document under a generated id and return the id
    pub async fn create_document<T: Serialize + ?Sized>(
        &self,
        path: &CollectionPath,
        data: &T,
    ) -> Result<String> {
        let body = encode_body(data)?;
        let mut conn = self.pool.acquire().await?;
        insert_document(&mut conn, path, body).await
    }

    /// Create or replace a document
    pub async fn set_document<T: Serialize + ?Sized>(&self, path: &DocumentPath, data: &T) -> Result<()> {
        let body = encode_body(data)?;
        let mut conn = self.pool.acquire().await?;
        upsert_document(&mut conn, path, body).await
    }

    /// Merge top-level fields into an existing document; `NotFound` if absent
    pub async fn update_document<T: Serialize + ?Sized>(
        &self,
        path: &DocumentPath,
        partial: &T,
    ) -> Result<()> {
        let patch = encode_body(partial)?;
        let mut conn = self.pool.acquire().await?;
        patch_document(&mut conn, path, patch).await
    }

    /// Remove a document; returns whether it existed
    pub async fn delete_document(&self, path: &DocumentPath) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        remove_document(&mut conn, path).await
    }

    /// Start a transaction
    pub async fn begin(&self) -> Result<DocumentTx> {
        Ok(DocumentTx {
            tx: self.pool.begin().await?,
        })
    }
}

/// The store's operations inside one transaction
///
/// Dropping without [`DocumentTx::commit`] rolls everything back.
pub struct DocumentTx {
    tx: Transaction<'static, Sqlite>,
}

impl DocumentTx {
    /// Take SQLite's write lock now instead of at the first write
    ///
    /// Reads made after this see no concurrent commits until the transaction
    /// ends.
    pub async fn lock_for_write(&mut self) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE 0")
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    pub async fn get_collection(&mut self, path: &CollectionPath) -> Result<Vec<Document>> {
        fetch_collection(&mut self.tx, path).await
    }

    pub async fn query_collection(
        &mut self,
        path: &CollectionPath,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        fetch_where(&mut self.tx, path, field, value).await
    }

    pub async fn get_document(&mut self, path: &DocumentPath) -> Result<Option<Document>> {
        fetch_document(&mut self.tx, path).await
    }

    pub async fn create_document<T: Serialize + ?Sized>(
        &mut self,
        path: &CollectionPath,
        data: &T,
    ) -> Result<String> {
        insert_document(&mut self.tx, path, encode_body(data)?).await
    }

    pub async fn set_document<T: Serialize + ?Sized>(&mut self, path: &DocumentPath, data: &T) -> Result<()> {
        upsert_document(&mut self.tx, path, encode_body(data)?).await
    }

    pub async fn update_document<T: Serialize + ?Sized>(
        &mut self,
        path: &DocumentPath,
        partial: &T,
    ) -> Result<()> {
        patch_document(&mut self.tx, path, encode_body(partial)?).await
    }

    pub async fn delete_document(&mut self, path: &DocumentPath) -> Result<bool> {
        remove_document(&mut self.tx, path).await
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
