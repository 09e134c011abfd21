//! # Embedding Provider
//!
//! Maps arbitrary text to fixed-length vectors and scores a query vector
//! against the precomputed corpus matrix by cosine similarity.
//!
//! Two providers ship with the crate:
//!
//! - [`HashingEmbedder`]: local feature-hashing model, deterministic and offline
//! - [`HttpEmbedder`]: OpenAI-compatible `/embeddings` endpoint with retries
//!   and a circuit breaker
//!
//! Providers are blocking from the caller's point of view. Async callers run
//! them on a blocking worker.

pub mod hashing;
pub mod http;

use std::sync::Arc;
use std::time::Instant;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::errors::{AppError, AppResult};

pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;

/// Capability interface for anything that turns text into vectors
///
/// Implementations must be deterministic for a fixed model and return vectors
/// of exactly [`EmbeddingProvider::dimensions`] components.
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs and metrics
    fn name(&self) -> &str;

    /// Length of every vector this provider produces
    fn dimensions(&self) -> usize;

    /// Encode many texts, returning one vector per input in input order
    fn encode_batch(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>>;

    /// Encode a single text
    fn encode(&self, text: &str) -> AppResult<Vec<f32>> {
        self.encode_batch(&[text])?.pop().ok_or_else(|| {
            AppError::Embedding(format!("{} returned no vector for a single input", self.name()))
        })
    }
}

/// Row-major matrix of corpus vectors, index-aligned with the corpus records
#[derive(Debug, Clone, Default)]
pub struct EmbeddingMatrix {
    dimensions: usize,
    rows: Vec<Vec<f32>>,
}

impl EmbeddingMatrix {
    /// Build a matrix, rejecting rows whose length differs from `dimensions`
    pub fn from_rows(rows: Vec<Vec<f32>>, dimensions: usize) -> AppResult<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != dimensions)
        {
            return Err(AppError::Embedding(format!(
                "vector {} has {} components, expected {}",
                index,
                row.len(),
                dimensions
            )));
        }
        Ok(Self { dimensions, rows })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Vector length of every row
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Row at `index`
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cosine similarity of `query` against every row
    pub fn similarity(&self, query: &[f32]) -> Vec<f32> {
        similarity(query, self)
    }
}

/// Cosine similarity in `[-1, 1]`; 0 when either vector has zero norm or lengths differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// One cosine score per matrix row, in row order
pub fn similarity(query: &[f32], matrix: &EmbeddingMatrix) -> Vec<f32> {
    let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();
    if query_norm == 0.0 || query.len() != matrix.dimensions {
        return vec![0.0; matrix.len()];
    }
    matrix
        .rows
        .iter()
        .map(|row| cosine_similarity(query, row))
        .collect()
}

/// Embed every text once, producing a matrix index-aligned with `texts`
///
/// Used at startup for the whole corpus; any failure is returned to the caller.
pub fn embed_all(provider: &dyn EmbeddingProvider, texts: &[String]) -> AppResult<EmbeddingMatrix> {
    let start = Instant::now();
    let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = provider.encode_batch(&inputs)?;

    if vectors.len() != texts.len() {
        return Err(AppError::Embedding(format!(
            "{} returned {} vectors for {} inputs",
            provider.name(),
            vectors.len(),
            texts.len()
        )));
    }

    let matrix = EmbeddingMatrix::from_rows(vectors, provider.dimensions())?;
    crate::observability::record_corpus_embedding_metrics(
        start.elapsed(),
        matrix.len(),
        matrix.dimensions(),
    );
    tracing::info!(
        provider = provider.name(),
        rows = matrix.len(),
        dimensions = matrix.dimensions(),
        duration_ms = start.elapsed().as_millis(),
        "Corpus embedding matrix built"
    );
    Ok(matrix)
}

/// Construct the provider selected by configuration
pub fn build_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderKind::Hashing => {
            Ok(Arc::new(HashingEmbedder::new(config.dimensions)?))
        }
        EmbeddingProviderKind::Http => Ok(Arc::new(HttpEmbedder::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_similarity_against_matrix() {
        let matrix =
            EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 3.0]], 2)
                .unwrap();
        let scores = matrix.similarity(&[1.0, 0.0]);
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
        assert!((scores[2] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);

        // zero query scores everything 0
        assert_eq!(matrix.similarity(&[0.0, 0.0]), vec![0.0; 3]);
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        assert!(EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![1.0]], 2).is_err());
    }

    #[test]
    fn test_embed_all_with_hashing_provider() {
        let provider = HashingEmbedder::new(32).unwrap();
        let texts = vec!["rice, onion".to_string(), "paneer".to_string()];
        let matrix = embed_all(&provider, &texts).unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.dimensions(), 32);
    }
}
