//! Optional text-embedding capability.
//!
//! Classifier and retriever depend only on `EmbeddingProvider`; when no
//! provider is configured they run their keyword/heuristic paths.

use medic_common::{MedicError, Result};
use std::sync::Arc;

/// Turns text into a dense vector
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts; fails as a whole if any single text fails
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Shared handle used by components that hold an optional provider
pub type SharedEmbeddings = Arc<dyn EmbeddingProvider>;

/// Provider that is never available
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEmbeddings;

impl EmbeddingProvider for NoEmbeddings {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(MedicError::Embedding("no embedding provider configured".to_string()))
    }
}

/// Cosine similarity in [-1, 1]; 0 for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_no_embeddings_always_fails() {
        let provider = NoEmbeddings;
        assert!(provider.embed("wifi").is_err());
        assert!(provider.embed_batch(&["a", "b"]).is_err());
    }
}
