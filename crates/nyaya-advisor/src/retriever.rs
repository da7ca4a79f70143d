use nyaya_ai::TextEmbedder;
use nyaya_core::{Document, Query};
use nyaya_store::CorpusStore;
use tracing::{debug, warn};

use crate::AdvisorError;

/// Embeds a query and fetches the nearest corpus sections.
pub struct Retriever {
    store: Box<dyn CorpusStore>,
    embedder: Box<dyn TextEmbedder>,
}

impl Retriever {
    pub fn new(store: Box<dyn CorpusStore>, embedder: Box<dyn TextEmbedder>) -> Self {
        Self { store, embedder }
    }

    /// Up to `k` non-empty documents, most similar first. Fewer only when
    /// the corpus holds fewer non-empty sections.
    ///
    /// Store and embedding faults are both reported as
    /// [`AdvisorError::RetrievalUnavailable`].
    pub async fn retrieve(&mut self, query: &Query, k: usize) -> Result<Vec<Document>, AdvisorError> {
        let vector = self.embedder.embed(query.as_str()).map_err(|e| {
            warn!(error = %e, "query embedding failed");
            AdvisorError::RetrievalUnavailable(format!("embedding failed: {e}"))
        })?;

        // Blank rows do not count against k: widen the search until k
        // non-blank sections are found or the corpus runs out.
        let mut limit = k;
        let mut docs = loop {
            let mut docs = self.store.nearest(&vector, limit).await.map_err(|e| {
                warn!(error = %e, "corpus search failed");
                AdvisorError::RetrievalUnavailable(e.to_string())
            })?;
            let exhausted = docs.len() < limit;
            docs.retain(|d| !d.content.trim().is_empty());
            if docs.len() >= k || exhausted {
                break docs;
            }
            limit = limit.saturating_mul(2);
        };
        docs.truncate(k);

        debug!(k, returned = docs.len(), "retrieved sections");
        Ok(docs)
    }

    /// Corpus size, for status display.
    pub async fn corpus_size(&self) -> Result<usize, AdvisorError> {
        self.store
            .count()
            .await
            .map_err(|e| AdvisorError::RetrievalUnavailable(e.to_string()))
    }
}
