//! LanceDB corpus store for BNS section text and embeddings.
//!
//! The persisted index is built elsewhere; this store only reads it. The
//! database directory is checked on every call, so a missing directory is
//! reported as [`StoreError::Unavailable`] and a restored one is picked up
//! by the next query.

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use nyaya_core::{corpus, Document};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::rows::documents_from_batches;
use crate::{CorpusStore, StoreError};

/// Read-only LanceDB store over the `bns_sections` table.
pub struct LanceStore {
    path: PathBuf,
    uri: String,
    table_name: String,
    db: Mutex<Option<lancedb::Connection>>,
}

impl LanceStore {
    /// Prepare a store for the LanceDB database at `path`.
    ///
    /// No connection is made until the first query.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            uri,
            table_name: corpus::TABLE.to_string(),
            db: Mutex::new(None),
        })
    }

    /// Use a table other than `bns_sections`.
    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the corpus table.
    pub async fn sections(&self) -> Result<lancedb::Table, StoreError> {
        let db = self.connection().await?;
        let table = db.open_table(&self.table_name).execute().await?;
        Ok(table)
    }

    /// List table names in the database.
    pub async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let db = self.connection().await?;
        let names = db.table_names().execute().await?;
        Ok(names)
    }

    /// Vector similarity search on the corpus embedding column.
    ///
    /// Returns the nearest `limit` rows to the query vector, ordered by distance.
    pub async fn search_sections(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RecordBatch>, StoreError> {
        let table = self.sections().await?;
        let results: Vec<RecordBatch> = table
            .vector_search(query_vector)?
            .column(corpus::VECTOR)
            .limit(limit)
            .execute()
            .await?
            .try_collect()
            .await?;
        Ok(results)
    }

    // ── Internal ──

    async fn connection(&self) -> Result<lancedb::Connection, StoreError> {
        let mut guard = self.db.lock().await;

        if !self.path.is_dir() {
            if guard.take().is_some() {
                warn!(path = %self.path.display(), "corpus directory disappeared, dropping connection");
            }
            return Err(StoreError::Unavailable(self.path.clone()));
        }

        if let Some(db) = guard.as_ref() {
            return Ok(db.clone());
        }

        let db = lancedb::connect(&self.uri).execute().await?;
        info!(path = %self.path.display(), table = %self.table_name, "connected to corpus store");
        *guard = Some(db.clone());
        Ok(db)
    }
}

#[async_trait]
impl CorpusStore for LanceStore {
    async fn nearest(&self, query_vector: &[f32], k: usize) -> Result<Vec<Document>, StoreError> {
        let batches = self.search_sections(query_vector, k).await?;
        let mut scored = documents_from_batches(&batches)?;

        // Batches from a single search are already distance-ordered; the
        // stable sort only guards against multi-batch interleaving and keeps
        // backend order for equal distances.
        scored.sort_by(|a, b| {
            let da = a.distance.unwrap_or(f32::INFINITY);
            let db = b.distance.unwrap_or(f32::INFINITY);
            da.total_cmp(&db)
        });
        scored.truncate(k);

        debug!(k, returned = scored.len(), "lance nearest-neighbour search");
        Ok(scored.into_iter().map(|s| s.document).collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let table = self.sections().await?;
        let count = table.count_rows(None).await?;
        Ok(count)
    }
}
