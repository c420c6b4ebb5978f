//! Retrieval snippets.

use serde::{Deserialize, Serialize};

/// A paragraph from the grounding corpus with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Corpus file the paragraph came from
    pub source: String,
    pub text: String,
    /// Non-negative; higher is more relevant
    pub score: f64,
}

/// Render snippets as prompt grounding text, one bullet per snippet
pub fn format_snippets(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .map(|s| format!("- [{}] {}", s.source, s.text.replace('\n', " ")))
        .collect::<Vec<_>>()
        .join("\n")
}
