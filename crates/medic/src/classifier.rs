//! Problem category classifier.
//!
//! Heuristic mode counts regex hits per category and is always available.
//! Embedding mode ranks categories by cosine similarity between the issue
//! text and the category labels; any embedding failure drops back to the
//! heuristic result without surfacing an error.

use crate::embeddings::{cosine_similarity, SharedEmbeddings};
use medic_common::{Category, CategoryPrediction};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Number of ranked candidates returned with a prediction
pub const TOP_CANDIDATES: usize = 3;

/// Lexical field of each category, case-insensitive, matched anywhere
const CATEGORY_PATTERNS: [(Category, &[&str]); 9] = [
    (
        Category::Power,
        &[r"battery|charger|power|turn on|won't start|dead|plug|charge|power button|no lights|black screen"],
    ),
    (
        Category::Boot,
        &[r"boot|bios|grub|startup|won't start|blue screen|kernel panic|post|loading"],
    ),
    (
        Category::Hardware,
        &[r"ram|memory|disk|drive|motherboard|cpu|fan|temperature|beep|clicking|hardware"],
    ),
    (
        Category::Physical,
        &[r"dropped|spill|liquid|water|coffee|damage|cracked|broken|truck|physical"],
    ),
    (
        Category::Software,
        &[r"driver|application|program|crash|freeze|virus|malware|update|install|corrupt"],
    ),
    (
        Category::User,
        &[r"how to|don't know|confused|wrong|not mine|toy|fake|expected|should|supposed"],
    ),
    (
        Category::Network,
        &[r"wifi|wlan|wireless|internet|network|connection|dns|ip\s+addr|ethernet|gateway|ssid"],
    ),
    (
        Category::Performance,
        &[r"slow|lag|freeze|hang|high cpu|memory|swap|load|iowait|overheat"],
    ),
    (
        Category::System,
        &[r"kernel|dmesg|journalctl|os-release|packages|configuration|settings"],
    ),
];

static HEURISTICS: LazyLock<Vec<(Category, Vec<Regex>)>> = LazyLock::new(|| {
    CATEGORY_PATTERNS
        .iter()
        .map(|(category, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){}", p)).expect("category pattern"))
                .collect();
            (*category, compiled)
        })
        .collect()
});

/// Which path produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    Heuristic,
    Embedding,
}

/// Maps issue text to one of the fixed categories
pub struct CategoryClassifier {
    embeddings: Option<SharedEmbeddings>,
    /// Label vectors in `Category::ALL` order, computed once
    label_vectors: Vec<Vec<f32>>,
}

impl CategoryClassifier {
    /// Heuristic-only classifier
    pub fn new() -> Self {
        Self {
            embeddings: None,
            label_vectors: Vec::new(),
        }
    }

    /// Classifier that prefers embedding similarity. If the label set cannot
    /// be embedded the classifier stays heuristic-only.
    pub fn with_embeddings(provider: SharedEmbeddings) -> Self {
        let labels: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        match provider.embed_batch(&labels) {
            Ok(vectors) if vectors.len() == labels.len() => {
                info!("Category classifier: embedding mode ({} labels)", labels.len());
                Self {
                    embeddings: Some(provider),
                    label_vectors: vectors,
                }
            }
            Ok(vectors) => {
                warn!(
                    "Category classifier: provider returned {} label vectors, expected {}; using heuristics",
                    vectors.len(),
                    labels.len()
                );
                Self::new()
            }
            Err(e) => {
                warn!("Category classifier: label embedding failed ({}); using heuristics", e);
                Self::new()
            }
        }
    }

    pub fn mode(&self) -> ClassifierMode {
        if self.embeddings.is_some() {
            ClassifierMode::Embedding
        } else {
            ClassifierMode::Heuristic
        }
    }

    /// Classify issue text
    pub fn classify(&self, text: &str) -> CategoryPrediction {
        if text.trim().is_empty() {
            return CategoryPrediction {
                label: Category::System,
                confidence: 0.0,
                candidates: vec![(Category::System, 0.0)],
            };
        }

        if let Some(prediction) = self.classify_by_embedding(text) {
            return prediction;
        }

        let ranked = heuristic_scores(text);
        let (label, confidence) = ranked[0];
        CategoryPrediction {
            label,
            confidence,
            candidates: ranked.into_iter().take(TOP_CANDIDATES).collect(),
        }
    }

    fn classify_by_embedding(&self, text: &str) -> Option<CategoryPrediction> {
        let provider = self.embeddings.as_ref()?;
        let query = match provider.embed(text) {
            Ok(v) => v,
            Err(e) => {
                debug!("Category classifier: query embedding failed ({}), falling back", e);
                return None;
            }
        };

        if self.label_vectors.iter().any(|v| v.len() != query.len()) {
            debug!(
                "Category classifier: query has {} dimensions, labels differ; falling back",
                query.len()
            );
            return None;
        }

        let mut pairs: Vec<(Category, f64)> = Category::ALL
            .iter()
            .zip(self.label_vectors.iter())
            .map(|(category, vector)| (*category, cosine_similarity(vector, &query) as f64))
            .collect();
        if pairs.iter().any(|(_, sim)| !sim.is_finite()) {
            debug!("Category classifier: non-finite similarity; falling back");
            return None;
        }
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (label, similarity) = pairs[0];
        // Map cosine [-1, 1] onto [0, 1]
        let confidence = ((similarity + 1.0) / 2.0).clamp(0.0, 1.0);
        pairs.truncate(TOP_CANDIDATES);

        Some(CategoryPrediction {
            label,
            confidence,
            candidates: pairs,
        })
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-category pattern hits normalized by their total, best first.
/// Ties keep taxonomy order.
pub fn heuristic_scores(text: &str) -> Vec<(Category, f64)> {
    let raw: Vec<(Category, f64)> = HEURISTICS
        .iter()
        .map(|(category, patterns)| {
            let hits = patterns.iter().filter(|p| p.is_match(text)).count();
            (*category, hits as f64)
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, s)| s).sum();
    let total = if total > 0.0 { total } else { 1.0 };

    let mut scores: Vec<(Category, f64)> = raw.into_iter().map(|(c, s)| (c, s / total)).collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
}
