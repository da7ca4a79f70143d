//! Corpus store: read-only nearest-neighbour search over BNS sections.
//!
//! [`LanceStore`] reads the persisted LanceDB index; [`MemoryStore`] holds a
//! small corpus in memory.

use async_trait::async_trait;
use nyaya_core::Document;

mod error;
pub use error::StoreError;

mod memory;
pub use memory::{cosine_similarity, MemoryStore};

pub mod rows;

#[cfg(feature = "lancedb")]
mod lance;
#[cfg(feature = "lancedb")]
pub use lance::LanceStore;

/// Similarity search over an already-embedded corpus.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Up to `k` documents nearest to `query_vector`, most similar first.
    async fn nearest(&self, query_vector: &[f32], k: usize) -> Result<Vec<Document>, StoreError>;

    /// Number of documents in the corpus.
    async fn count(&self) -> Result<usize, StoreError>;
}
