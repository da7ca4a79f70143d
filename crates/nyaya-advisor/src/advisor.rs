//! Request orchestration: retrieve → compose → generate.
//!
//! One [`Advisor`] owns the retriever and generator for the life of the
//! process. `submit` takes `&mut self`, so at most one analysis is in flight.

use chrono::{DateTime, Utc};
use nyaya_ai::{Answer, AnswerGenerator};
use nyaya_core::{compose_within, ContextBudget, Document, Query};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{AdvisorConfig, AdvisorError, Retriever};

/// Where the advisor is in handling the latest submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Retrieving,
    Composing,
    Generating,
    Displaying,
    Failed,
}

/// Successful analysis of one incident.
#[derive(Debug, Clone)]
pub struct Consultation {
    pub query: String,
    pub answer: Answer,
    /// Retrieved sections, in retrieval order.
    pub evidence: Vec<Document>,
    /// Context actually sent to the model (after the budget guard).
    pub context: String,
    pub answered_at: DateTime<Utc>,
}

/// Result of a single submission.
#[derive(Debug)]
pub enum Outcome {
    /// Blank input; nothing happened.
    Ignored,
    Answered(Consultation),
    Failed(AdvisorError),
}

pub struct Advisor {
    retriever: Retriever,
    generator: Box<dyn AnswerGenerator>,
    top_k: usize,
    budget: Option<ContextBudget>,
    phase: Phase,
    shutdown: CancellationToken,
}

impl Advisor {
    /// Assemble an advisor from already-constructed parts.
    pub fn new(
        retriever: Retriever,
        generator: Box<dyn AnswerGenerator>,
        config: &AdvisorConfig,
    ) -> Result<Self, AdvisorError> {
        config.validate()?;
        Ok(Self {
            retriever,
            generator,
            top_k: config.top_k,
            budget: config.context_budget(),
            phase: Phase::Idle,
            shutdown: CancellationToken::new(),
        })
    }

    /// Build the offline stack from configuration: LanceDB corpus, ONNX
    /// embedder, Ollama generator.
    ///
    /// A missing corpus directory is not an error here; it surfaces as
    /// [`AdvisorError::RetrievalUnavailable`] on the first query.
    #[cfg(all(feature = "lancedb", feature = "onnx"))]
    pub fn open(config: &AdvisorConfig) -> anyhow::Result<Self> {
        use nyaya_ai::{Embedder, OllamaClient};
        use nyaya_store::LanceStore;

        let store = LanceStore::open(&config.corpus_dir)?;
        let embedder = Embedder::load(&config.model_dir)?;
        let generator = OllamaClient::new(config.ollama_url.clone(), config.model.clone())
            .with_timeout(config.timeout)
            .with_retry(config.retry);

        let retriever = Retriever::new(Box::new(store), Box::new(embedder));
        let advisor = Self::new(retriever, Box::new(generator), config)?;
        info!(
            corpus = %config.corpus_dir.display(),
            model = %config.model,
            top_k = config.top_k,
            "advisor ready"
        );
        Ok(advisor)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// A cancellation token for one request, also cancelled by [`close`](Self::close).
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Analyse an incident description.
    pub async fn submit(&mut self, text: &str) -> Outcome {
        let cancel = self.request_token();
        self.submit_with(text, &cancel).await
    }

    /// Analyse an incident description, aborting generation when `cancel` fires.
    pub async fn submit_with(&mut self, text: &str, cancel: &CancellationToken) -> Outcome {
        if matches!(self.phase, Phase::Displaying | Phase::Failed) {
            self.phase = Phase::Idle;
        }

        let Some(query) = Query::parse(text) else {
            debug!("blank submission ignored");
            return Outcome::Ignored;
        };

        match self.run(&query, cancel).await {
            Ok(consultation) => {
                self.phase = Phase::Displaying;
                Outcome::Answered(consultation)
            }
            Err(e) => {
                warn!(error = %e, phase = ?self.phase, "analysis failed");
                self.phase = Phase::Failed;
                Outcome::Failed(e)
            }
        }
    }

    async fn run(&mut self, query: &Query, cancel: &CancellationToken) -> Result<Consultation, AdvisorError> {
        self.phase = Phase::Retrieving;
        let evidence = self.retriever.retrieve(query, self.top_k).await?;

        self.phase = Phase::Composing;
        let prompt = compose_within(&evidence, query, self.budget);

        self.phase = Phase::Generating;
        let answer = self.generator.generate(&prompt, cancel).await?;

        info!(
            sections = evidence.len(),
            model = %answer.model,
            "analysis complete"
        );
        Ok(Consultation {
            query: query.as_str().to_string(),
            answer,
            evidence,
            context: prompt.context().to_string(),
            answered_at: Utc::now(),
        })
    }

    /// Tear down: cancels every outstanding request token.
    pub fn close(self) {
        self.shutdown.cancel();
        info!("advisor closed");
    }
}
