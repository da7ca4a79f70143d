//! AI inference layer: ONNX Runtime for query embeddings, Ollama for answers.

use async_trait::async_trait;
use nyaya_core::ComposedPrompt;
use tokio_util::sync::CancellationToken;

mod error;
pub use error::GenerationError;

pub mod ollama;
pub use ollama::{OllamaClient, ServerStatus};

pub mod retry;
pub use retry::RetryPolicy;

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::Embedder;

/// Maps text to a fixed-dimension vector.
pub trait TextEmbedder: Send {
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Free-text analysis produced by the language model. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub model: String,
}

/// A language model that answers a composed prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        cancel: &CancellationToken,
    ) -> Result<Answer, GenerationError>;

    /// Model name, for status display.
    fn model(&self) -> &str;
}
