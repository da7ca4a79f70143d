//! Prompt composition: retrieved sections + incident → chat messages.
//!
//! The system instruction is a fixed template. Retrieved section texts are
//! joined with blank lines, in retrieval order, and substituted for the
//! `{context}` slot. The incident description goes verbatim into the user
//! message.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Document, Query};

/// Placeholder replaced by the retrieved context.
pub const CONTEXT_SLOT: &str = "{context}";

/// Fixed legal-advisor instruction.
pub const SYSTEM_TEMPLATE: &str = "\
You are an expert Indian Legal Advisor specialized in the Bharatiya Nyaya Sanhita (BNS) 2023.
Use the following pieces of retrieved context to answer the question.
If you don't know the answer, say that you don't know.

RULES:
1. Identify the specific BNS Section numbers relevant to the crime.
2. Classify the offense as COGNIZABLE (Police can arrest) or NON-COGNIZABLE if possible.
3. State the PUNISHMENT clearly.

CONTEXT FROM BNS DATABASE:
{context}";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Rough characters-per-token ratio used for budgeting.
const CHARS_PER_TOKEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// System message followed by the user's incident description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedPrompt {
    context: String,
    messages: [Message; 2],
}

impl ComposedPrompt {
    /// The joined section texts substituted into the template.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn user(&self) -> &Message {
        &self.messages[1]
    }
}

/// Build the two-message prompt for `query` from ranked `documents`.
pub fn compose(documents: &[Document], query: &Query) -> ComposedPrompt {
    let context = documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    let system = SYSTEM_TEMPLATE.replacen(CONTEXT_SLOT, &context, 1);

    ComposedPrompt {
        context,
        messages: [
            Message {
                role: Role::System,
                content: system,
            },
            Message {
                role: Role::User,
                content: query.as_str().to_string(),
            },
        ],
    }
}

/// Upper bound on the estimated size of the retrieved context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_tokens: usize,
}

impl ContextBudget {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    fn max_chars(&self) -> usize {
        self.max_tokens.saturating_mul(CHARS_PER_TOKEN)
    }
}

/// Estimated token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Keep the longest ranked prefix of `documents` that fits `budget`.
///
/// If the top document alone is over budget it is kept, truncated at a
/// character boundary, so the generator always sees the best match.
pub fn select_within_budget(documents: &[Document], budget: ContextBudget) -> Vec<Document> {
    let mut used = 0usize;
    let mut kept = Vec::with_capacity(documents.len());

    for doc in documents {
        let cost = estimate_tokens(&doc.content);
        if used + cost > budget.max_tokens {
            break;
        }
        used += cost;
        kept.push(doc.clone());
    }

    if kept.is_empty()
        && let Some(top) = documents.first()
    {
        let truncated: String = top.content.chars().take(budget.max_chars()).collect();
        debug!(
            section = top.section(),
            max_tokens = budget.max_tokens,
            "top document exceeds context budget, truncating"
        );
        kept.push(Document {
            content: truncated,
            metadata: top.metadata.clone(),
        });
    } else if kept.len() < documents.len() {
        debug!(
            kept = kept.len(),
            dropped = documents.len() - kept.len(),
            max_tokens = budget.max_tokens,
            "context budget reached"
        );
    }

    kept
}

/// [`compose`] after applying [`select_within_budget`].
pub fn compose_within(
    documents: &[Document],
    query: &Query,
    budget: Option<ContextBudget>,
) -> ComposedPrompt {
    match budget {
        Some(budget) => compose(&select_within_budget(documents, budget), query),
        None => compose(documents, query),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SECTION_KEY, SECTION_NAME_KEY};

    fn q(text: &str) -> Query {
        Query::parse(text).unwrap()
    }

    fn section(id: &str, name: &str, text: &str) -> Document {
        Document::new(text)
            .with_meta(SECTION_KEY, id)
            .with_meta(SECTION_NAME_KEY, name)
    }

    #[test]
    fn empty_documents_give_empty_context() {
        let prompt = compose(&[], &q("Someone stole my bicycle"));
        assert_eq!(prompt.context(), "");
        assert!(prompt.system().content.ends_with("CONTEXT FROM BNS DATABASE:\n"));
        assert_eq!(prompt.user().content, "Someone stole my bicycle");
    }

    #[test]
    fn context_joined_in_retrieval_order() {
        let docs = vec![
            section("351", "Criminal intimidation", "A threatens B with injury."),
            section("115", "Voluntarily causing hurt", "Whoever causes bodily pain."),
            section("352", "Intentional insult", "Insult to provoke breach of peace."),
        ];
        let prompt = compose(&docs, &q("My neighbor threatened to hit me"));
        assert_eq!(
            prompt.context(),
            "A threatens B with injury.\n\n\
             Whoever causes bodily pain.\n\n\
             Insult to provoke breach of peace."
        );
        assert!(prompt.system().content.ends_with(prompt.context()));
    }

    #[test]
    fn system_template_literal() {
        let prompt = compose(&[Document::new("CTX")], &q("x"));
        let expected = "You are an expert Indian Legal Advisor specialized in the Bharatiya Nyaya Sanhita (BNS) 2023.\n\
                        Use the following pieces of retrieved context to answer the question.\n\
                        If you don't know the answer, say that you don't know.\n\
                        \n\
                        RULES:\n\
                        1. Identify the specific BNS Section numbers relevant to the crime.\n\
                        2. Classify the offense as COGNIZABLE (Police can arrest) or NON-COGNIZABLE if possible.\n\
                        3. State the PUNISHMENT clearly.\n\
                        \n\
                        CONTEXT FROM BNS DATABASE:\n\
                        CTX";
        assert_eq!(prompt.system().content, expected);
    }

    #[test]
    fn roles_in_order() {
        let prompt = compose(&[], &q("incident"));
        let roles: Vec<Role> = prompt.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
    }

    #[test]
    fn compose_is_deterministic() {
        let docs = vec![Document::new("one"), Document::new("two")];
        let query = q("incident");
        assert_eq!(compose(&docs, &query), compose(&docs, &query));
    }

    #[test]
    fn placeholder_inside_context_not_expanded() {
        let prompt = compose(&[Document::new("literal {context} text")], &q("x"));
        assert!(prompt.system().content.ends_with("literal {context} text"));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::System).unwrap();
        assert_eq!(json, "\"system\"");
    }

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn budget_keeps_ranked_prefix() {
        let docs = vec![
            Document::new("a".repeat(40)), // 10 tokens
            Document::new("b".repeat(40)), // 10 tokens
            Document::new("c".repeat(40)), // 10 tokens
        ];
        let kept = select_within_budget(&docs, ContextBudget::new(25));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].content, docs[0].content);
        assert_eq!(kept[1].content, docs[1].content);
    }

    #[test]
    fn budget_stops_at_first_overflow() {
        // A small third document must not jump ahead of an oversized second.
        let docs = vec![
            Document::new("a".repeat(40)),
            Document::new("b".repeat(400)),
            Document::new("c".repeat(4)),
        ];
        let kept = select_within_budget(&docs, ContextBudget::new(20));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn oversized_top_document_truncated() {
        let docs = vec![section("103", "Murder", &"m".repeat(100))];
        let kept = select_within_budget(&docs, ContextBudget::new(5));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].content.len(), 20);
        assert_eq!(kept[0].section(), "103");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let docs = vec![Document::new("धारा".repeat(10))];
        let kept = select_within_budget(&docs, ContextBudget::new(1));
        assert_eq!(kept[0].content.chars().count(), 4);
    }

    #[test]
    fn compose_within_without_budget_matches_compose() {
        let docs = vec![Document::new("one"), Document::new("two")];
        let query = q("incident");
        assert_eq!(compose_within(&docs, &query, None), compose(&docs, &query));
    }

    #[test]
    fn compose_within_empty_documents() {
        let prompt = compose_within(&[], &q("incident"), Some(ContextBudget::new(10)));
        assert_eq!(prompt.context(), "");
    }
}
