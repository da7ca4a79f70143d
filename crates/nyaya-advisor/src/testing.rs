//! Test doubles: keyword embedder, switchable store, scripted generator.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nyaya_ai::{Answer, AnswerGenerator, GenerationError, TextEmbedder};
use nyaya_core::{ComposedPrompt, Document, SECTION_KEY, SECTION_NAME_KEY};
use nyaya_store::{CorpusStore, MemoryStore, StoreError};
use tokio_util::sync::CancellationToken;

const KEYWORDS: &[&[&str]] = &[
    &["threat", "intimidat"],
    &["hit", "hurt", "injur"],
    &["insult"],
    &["steal", "stole", "theft"],
    &["kill", "murder", "death"],
];

/// One dimension per keyword group, counting matches.
pub struct KeywordEmbedder;

impl TextEmbedder for KeywordEmbedder {
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .map(|group| group.iter().filter(|k| lower.contains(*k)).count() as f32)
        .collect()
}

fn section(id: &str, name: &str, text: &str) -> (Document, Vec<f32>) {
    let doc = Document::new(text)
        .with_meta(SECTION_KEY, id)
        .with_meta(SECTION_NAME_KEY, name);
    (doc, keyword_vector(text))
}

/// Five BNS sections with keyword embeddings.
pub fn bns_corpus() -> Vec<(Document, Vec<f32>)> {
    vec![
        section(
            "351",
            "Criminal intimidation",
            "Whoever threatens another with any injury to his person, reputation or property commits criminal intimidation.",
        ),
        section(
            "115",
            "Voluntarily causing hurt",
            "Whoever does any act with the intention of causing hurt to any person is said to voluntarily cause hurt.",
        ),
        section(
            "352",
            "Intentional insult with intent to provoke breach of peace",
            "Whoever intentionally insults, and thereby gives provocation to any person, with threats of breaking the public peace.",
        ),
        section(
            "303",
            "Theft",
            "Whoever, intending to take dishonestly any movable property, is said to commit theft.",
        ),
        section(
            "103",
            "Punishment for murder",
            "Whoever commits murder shall be punished with death or imprisonment for life.",
        ),
    ]
}

/// In-memory store that can be switched off to simulate a missing index.
pub struct FlakyStore {
    inner: MemoryStore,
    available: Arc<AtomicBool>,
    searches: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(entries: Vec<(Document, Vec<f32>)>) -> Self {
        let mut inner = MemoryStore::new();
        for (doc, emb) in entries {
            inner.insert(doc, emb);
        }
        Self {
            inner,
            available: Arc::new(AtomicBool::new(true)),
            searches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn availability(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.available)
    }

    pub fn searches(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.searches)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(PathBuf::from("./bns_vector_db")))
        }
    }
}

#[async_trait]
impl CorpusStore for FlakyStore {
    async fn nearest(&self, query_vector: &[f32], k: usize) -> Result<Vec<Document>, StoreError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.nearest(query_vector, k).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.count().await
    }
}

/// Generator that replays scripted results, then a fixed answer.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<&'static str, GenerationError>>>,
    fallback: &'static str,
    prompts: Arc<Mutex<Vec<ComposedPrompt>>>,
}

impl ScriptedGenerator {
    pub fn answering(text: &'static str) -> Self {
        Self::scripted_with_fallback(Vec::new(), text)
    }

    pub fn scripted(script: Vec<Result<&'static str, GenerationError>>) -> Self {
        Self::scripted_with_fallback(script, "ok")
    }

    fn scripted_with_fallback(
        script: Vec<Result<&'static str, GenerationError>>,
        fallback: &'static str,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Arc<Mutex<Vec<ComposedPrompt>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &ComposedPrompt,
        cancel: &CancellationToken,
    ) -> Result<Answer, GenerationError> {
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        self.prompts.lock().unwrap().push(prompt.clone());
        let next = self.script.lock().unwrap().pop_front();
        let text = match next {
            Some(result) => result?,
            None => self.fallback,
        };
        Ok(Answer {
            text: text.to_string(),
            model: "scripted".to_string(),
        })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
