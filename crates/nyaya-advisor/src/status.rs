//! Readiness of the corpus store and the model server.

use nyaya_ai::{OllamaClient, ServerStatus};
use nyaya_store::CorpusStore;
use tracing::debug;

#[derive(Debug)]
pub struct SystemStatus {
    /// Section count, or why the corpus could not be read.
    pub corpus: Result<usize, String>,
    /// Model server report, or why it could not be reached.
    pub model_server: Result<ServerStatus, String>,
}

impl SystemStatus {
    /// Corpus readable and configured model installed.
    pub fn is_ready(&self) -> bool {
        self.corpus.is_ok() && self.model_server.as_ref().is_ok_and(|s| s.model_ready)
    }
}

pub async fn check_status(store: &dyn CorpusStore, client: &OllamaClient) -> SystemStatus {
    let corpus = store.count().await.map_err(|e| e.to_string());
    let model_server = client.status().await.map_err(|e| e.to_string());
    debug!(?corpus, ready = model_server.is_ok(), "status checked");
    SystemStatus {
        corpus,
        model_server,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{bns_corpus, FlakyStore};

    fn unreachable_client() -> OllamaClient {
        OllamaClient::new("http://127.0.0.1:9", "mistral").with_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn reports_corpus_size_and_unreachable_server() {
        let store = FlakyStore::new(bns_corpus());
        let status = check_status(&store, &unreachable_client()).await;
        assert_eq!(status.corpus, Ok(5));
        assert!(status.model_server.is_err());
        assert!(!status.is_ready());
    }

    #[tokio::test]
    async fn reports_missing_corpus() {
        let store = FlakyStore::new(bns_corpus());
        store.availability().store(false, std::sync::atomic::Ordering::SeqCst);
        let status = check_status(&store, &unreachable_client()).await;
        let err = status.corpus.unwrap_err();
        assert!(err.contains("bns_vector_db"));
    }
}
