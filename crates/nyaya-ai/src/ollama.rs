//! Ollama chat client for answer generation.
//!
//! Endpoints used:
//! - `POST /api/chat` (non-streaming) for the legal analysis
//! - `GET /api/tags` for the status check

use std::time::Duration;

use async_trait::async_trait;
use nyaya_core::{ComposedPrompt, Message};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::retry::{with_retry, RetryPolicy};
use crate::{Answer, AnswerGenerator, GenerationError};

/// Default Ollama endpoint.
pub const OLLAMA_DEFAULT_URL: &str = "http://127.0.0.1:11434";

/// Default model.
pub const DEFAULT_MODEL: &str = "mistral";

/// Default per-attempt generation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

/// Reachability of the model server and presence of the configured model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub url: String,
    pub model: String,
    pub installed: Vec<String>,
    pub model_ready: bool,
}

/// HTTP client for a local Ollama server.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OllamaClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:11434`) and `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query `/api/tags` and check whether the configured model is installed.
    pub async fn status(&self) -> Result<ServerStatus, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = serde_json::from_str(&resp.text().await?)?;
        let installed: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        let model_ready = installed.iter().any(|name| model_matches(name, &self.model));

        Ok(ServerStatus {
            url: self.base_url.clone(),
            model: self.model.clone(),
            installed,
            model_ready,
        })
    }

    async fn chat_once(&self, messages: &[Message]) -> Result<Answer, GenerationError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let send = async {
            let resp = self.client.post(&url).json(&request).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GenerationError::Server {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok::<String, GenerationError>(resp.text().await?)
        };

        let body = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        if parsed.message.content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse {
                model: self.model.clone(),
            });
        }

        Ok(Answer {
            text: parsed.message.content,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[async_trait]
impl AnswerGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        cancel: &CancellationToken,
    ) -> Result<Answer, GenerationError> {
        info!(model = %self.model, url = %self.base_url, "requesting legal analysis");
        let answer = with_retry(self.retry, cancel, "ollama chat", || {
            self.chat_once(prompt.messages())
        })
        .await?;
        debug!(chars = answer.text.len(), "analysis received");
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// `mistral` matches `mistral` and `mistral:latest`, not `mistral-nemo`.
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed
            .strip_prefix(wanted)
            .is_some_and(|rest| rest.starts_with(':'))
}
