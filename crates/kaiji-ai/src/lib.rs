//! Language-model capabilities: batched title classification and document summaries.

pub mod classify;
pub mod client;
mod error;
pub mod summarize;

pub use classify::{
    ClassifierOutput, ClaudeClassifier, PayloadSource, TitleClassifier, TitleMatch,
    parse_classification,
};
pub use client::{ANTHROPIC_API_URL, DEFAULT_MODEL, MessagesClient};
pub use error::AiError;
pub use summarize::{ClaudeSummarizer, MAX_TEXT_CHARS, Summarizer, truncate_for_summary};
