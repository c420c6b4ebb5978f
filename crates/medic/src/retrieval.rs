//! Grounding snippet retrieval over a small, read-only document corpus.
//!
//! The corpus is loaded once at construction and never mutated afterwards, so
//! a retriever can be shared across concurrent diagnoses.

use crate::config::RetrievalConfig;
use crate::embeddings::{cosine_similarity, SharedEmbeddings};
use medic_common::Snippet;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Paragraph length bounds, in characters
pub const MIN_PARAGRAPH_CHARS: usize = 64;
pub const MAX_PARAGRAPH_CHARS: usize = 600;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern"));

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9_]+").expect("word pattern"));

/// One stored paragraph
#[derive(Debug, Clone)]
struct Passage {
    source: String,
    text: String,
    /// Lowercased copy for substring scoring
    lower: String,
}

/// Keyword retriever with an optional semantic scorer
pub struct HybridRetriever {
    passages: Vec<Passage>,
    embeddings: Option<SharedEmbeddings>,
    /// Parallel to `passages` when embeddings are active
    passage_vectors: Vec<Vec<f32>>,
}

impl HybridRetriever {
    /// Load up to `max_files` .md/.txt files from the configured directories
    pub fn from_config(config: &RetrievalConfig) -> Self {
        let mut documents = Vec::new();
        for path in corpus_files(&config.corpus_dirs, config.max_files) {
            match fs::read(&path) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    documents.push((path.display().to_string(), text));
                }
                Err(e) => warn!("Skipping corpus file {}: {}", path.display(), e),
            }
        }
        let retriever = Self::from_documents(documents);
        info!(
            "Retrieval corpus: {} paragraphs from {} dirs",
            retriever.len(),
            config.corpus_dirs.len()
        );
        retriever
    }

    /// Build from in-memory (source, text) documents
    pub fn from_documents<I, S, T>(documents: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut passages = Vec::new();
        for (source, text) in documents {
            let source = source.into();
            passages.extend(split_paragraphs(text.as_ref()).into_iter().map(|para| Passage {
                source: source.clone(),
                lower: para.to_lowercase(),
                text: para,
            }));
        }
        Self {
            passages,
            embeddings: None,
            passage_vectors: Vec::new(),
        }
    }

    /// Enable semantic scoring. Paragraphs are embedded once here; if that
    /// fails the retriever keeps its keyword scorer.
    pub fn with_embeddings(mut self, provider: SharedEmbeddings) -> Self {
        let texts: Vec<&str> = self.passages.iter().map(|p| p.text.as_str()).collect();
        match provider.embed_batch(&texts) {
            Ok(vectors) if vectors.len() == texts.len() => {
                info!("Retrieval: embedding mode ({} paragraphs)", texts.len());
                self.passage_vectors = vectors;
                self.embeddings = Some(provider);
            }
            Ok(_) => warn!("Retrieval: provider returned wrong vector count; keyword scoring only"),
            Err(e) => warn!("Retrieval: paragraph embedding failed ({}); keyword scoring only", e),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Top-k snippets for a query, best first. Never fails; an empty corpus
    /// or a query without matches yields an empty list.
    pub fn search(&self, query: &str, category_hint: Option<&str>, k: usize) -> Vec<Snippet> {
        if self.passages.is_empty() || k == 0 {
            return Vec::new();
        }

        if let Some(snippets) = self.search_semantic(query, category_hint, k) {
            return snippets;
        }

        let tokens = query_tokens(query, category_hint);
        let mut scored: Vec<Snippet> = self
            .passages
            .iter()
            .filter_map(|passage| {
                let score = keyword_score(&tokens, &passage.lower);
                (score > 0.0).then(|| Snippet {
                    source: passage.source.clone(),
                    text: passage.text.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        debug!("Retrieval: {} keyword hits for {} tokens", scored.len(), tokens.len());
        scored
    }

    fn search_semantic(&self, query: &str, category_hint: Option<&str>, k: usize) -> Option<Vec<Snippet>> {
        let provider = self.embeddings.as_ref()?;
        let text = match category_hint {
            Some(hint) => format!("{} {}", query, hint),
            None => query.to_string(),
        };
        let query_vector = match provider.embed(&text) {
            Ok(v) => v,
            Err(e) => {
                debug!("Retrieval: query embedding failed ({}), using keywords", e);
                return None;
            }
        };

        if self.passage_vectors.iter().any(|v| v.len() != query_vector.len()) {
            debug!(
                "Retrieval: query has {} dimensions, paragraphs differ; using keywords",
                query_vector.len()
            );
            return None;
        }

        let mut scored = Vec::with_capacity(self.passages.len());
        for (passage, vector) in self.passages.iter().zip(self.passage_vectors.iter()) {
            let similarity = cosine_similarity(vector, &query_vector) as f64;
            if !similarity.is_finite() {
                debug!("Retrieval: non-finite similarity for {}; using keywords", passage.source);
                return None;
            }
            scored.push(Snippet {
                source: passage.source.clone(),
                text: passage.text.clone(),
                score: ((similarity + 1.0) / 2.0).max(0.0),
            });
        }
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Some(scored)
    }
}

/// Corpus files in path order, capped
fn corpus_files(dirs: &[impl AsRef<Path>], max_files: usize) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            warn!("Corpus dir {} does not exist", dir.display());
            continue;
        }
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_doc = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "md" || ext == "txt");
            if entry.file_type().is_file() && is_doc {
                files.push(path.to_path_buf());
                if files.len() >= max_files {
                    return files;
                }
            }
        }
    }
    files
}

/// Blank-line separated paragraphs within the length bounds
fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|para| {
            let len = para.chars().count();
            (MIN_PARAGRAPH_CHARS..=MAX_PARAGRAPH_CHARS).contains(&len)
        })
        .map(String::from)
        .collect()
}

/// Lowercase word tokens, plus the category hint when given
pub fn query_tokens(query: &str, category_hint: Option<&str>) -> Vec<String> {
    let lower = query.to_lowercase();
    let mut tokens: Vec<String> = WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect();
    if let Some(hint) = category_hint.map(str::trim).filter(|h| !h.is_empty()) {
        tokens.push(hint.to_lowercase());
    }
    tokens
}

/// 2 per token occurrence found in the text (repeats count again), plus 1
/// per distinct token found
fn keyword_score(tokens: &[String], text_lower: &str) -> f64 {
    let repeated = tokens.iter().filter(|t| text_lower.contains(t.as_str())).count();
    let distinct: HashSet<&String> = tokens.iter().collect();
    let covered = distinct.iter().filter(|t| text_lower.contains(t.as_str())).count();
    (2 * repeated + covered) as f64
}
