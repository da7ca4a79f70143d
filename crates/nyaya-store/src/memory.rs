//! In-memory corpus with exhaustive cosine search.
//!
//! Used for tests and small fixture corpora. Ties are broken by insertion
//! order, so results are reproducible.

use async_trait::async_trait;
use nyaya_core::Document;

use crate::{CorpusStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<(Document, Vec<f32>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document with its precomputed embedding.
    pub fn insert(&mut self, document: Document, embedding: Vec<f32>) {
        self.entries.push((document, embedding));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CorpusStore for MemoryStore {
    async fn nearest(&self, query_vector: &[f32], k: usize) -> Result<Vec<Document>, StoreError> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, emb))| (i, cosine_similarity(query_vector, emb)))
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.entries[i].0.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}

/// Cosine similarity; zero when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
