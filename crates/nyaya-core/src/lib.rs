pub mod document;
pub mod prompt;
pub mod schema;

pub use document::{Document, Query, SECTION_KEY, SECTION_NAME_KEY};
pub use prompt::{
    compose, compose_within, estimate_tokens, select_within_budget, ComposedPrompt, ContextBudget,
    Message, Role, SYSTEM_TEMPLATE,
};
pub use schema::corpus;
