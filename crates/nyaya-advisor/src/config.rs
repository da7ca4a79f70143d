//! Runtime configuration for the advisor.

use std::path::PathBuf;
use std::time::Duration;

use nyaya_ai::ollama::{DEFAULT_MODEL, DEFAULT_TIMEOUT, OLLAMA_DEFAULT_URL};
use nyaya_ai::RetryPolicy;
use nyaya_core::ContextBudget;

use crate::AdvisorError;

pub const DEFAULT_CORPUS_DIR: &str = "./bns_vector_db";
pub const DEFAULT_MODEL_DIR: &str = "./my_offline_model";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_CONTEXT_TOKENS: usize = 3000;

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Persisted LanceDB corpus.
    pub corpus_dir: PathBuf,
    /// Offline sentence-transformer used to embed queries.
    pub model_dir: PathBuf,
    pub ollama_url: String,
    pub model: String,
    /// Sections retrieved per query.
    pub top_k: usize,
    /// Per-attempt generation timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Context budget in estimated tokens; `None` disables the guard.
    pub context_tokens: Option<usize>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from(DEFAULT_CORPUS_DIR),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            ollama_url: OLLAMA_DEFAULT_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            context_tokens: Some(DEFAULT_CONTEXT_TOKENS),
        }
    }
}

impl AdvisorConfig {
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if self.top_k == 0 {
            return Err(AdvisorError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(AdvisorError::InvalidConfig("timeout must be non-zero".into()));
        }
        if self.context_tokens == Some(0) {
            return Err(AdvisorError::InvalidConfig(
                "context budget must be at least 1 token".into(),
            ));
        }
        Ok(())
    }

    pub fn context_budget(&self) -> Option<ContextBudget> {
        self.context_tokens.map(ContextBudget::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_offline_layout() {
        let config = AdvisorConfig::default();
        assert_eq!(config.corpus_dir, PathBuf::from("./bns_vector_db"));
        assert_eq!(config.model_dir, PathBuf::from("./my_offline_model"));
        assert_eq!(config.model, "mistral");
        assert_eq!(config.top_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_top_k_rejected() {
        let config = AdvisorConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AdvisorError::InvalidConfig(_))));
    }

    #[test]
    fn zero_budget_rejected_but_none_allowed() {
        let zero = AdvisorConfig {
            context_tokens: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let unbounded = AdvisorConfig {
            context_tokens: None,
            ..Default::default()
        };
        assert!(unbounded.validate().is_ok());
        assert!(unbounded.context_budget().is_none());
    }
}
