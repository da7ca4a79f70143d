//! Corpus documents and validated user queries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the statute section identifier.
pub const SECTION_KEY: &str = "Section";
/// Metadata key holding the human-readable offence name.
pub const SECTION_NAME_KEY: &str = "Section_name";

const UNKNOWN_SECTION: &str = "Unknown";
const UNKNOWN_SECTION_NAME: &str = "N/A";

/// A single BNS section as held by the corpus store.
///
/// Documents are read-only once loaded; retrieval hands out owned copies in
/// ranked order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Section identifier, `"Unknown"` when the corpus row carries none.
    pub fn section(&self) -> &str {
        self.meta_or(SECTION_KEY, UNKNOWN_SECTION)
    }

    /// Offence name, `"N/A"` when the corpus row carries none.
    pub fn section_name(&self) -> &str {
        self.meta_or(SECTION_NAME_KEY, UNKNOWN_SECTION_NAME)
    }

    /// Evidence heading shown next to an answer.
    pub fn citation(&self) -> String {
        format!("Section {}: {}", self.section(), self.section_name())
    }

    fn meta_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.metadata.get(key).map(String::as_str).unwrap_or(default)
    }
}

/// An incident description submitted for analysis.
///
/// Only constructible from text that is non-empty after trimming. The
/// user text is kept verbatim for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Returns `None` for blank input, which callers treat as a no-op.
    pub fn parse(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
