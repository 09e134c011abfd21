//! # Test Helper Library
//!
//! Shared fixtures for integration tests: a stub embedding provider with
//! hand-picked vectors, and small corpus builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use pantry_match::corpus::{Corpus, RecipeRecord};
use pantry_match::embedding::{embed_all, EmbeddingMatrix, EmbeddingProvider};
use pantry_match::errors::{AppError, AppResult};

/// Embedding provider returning fixed vectors per exact input text
///
/// Unknown texts map to `fallback`. Every call is counted.
pub struct StubProvider {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    calls: AtomicUsize,
    fail: bool,
}

impl StubProvider {
    /// Two-dimensional stub whose unknown texts embed to `[0, 1]`
    pub fn new() -> Self {
        Self {
            dimensions: 2,
            vectors: HashMap::new(),
            fallback: vec![0.0, 1.0],
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Provider that fails every call
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Register the vector returned for `text`
    pub fn with(mut self, text: &str, vector: [f32; 2]) -> Self {
        self.vectors.insert(text.to_string(), vector.to_vec());
        self
    }

    /// Number of encode calls seen so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn encode_batch(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Embedding("stub provider unavailable".to_string()));
        }
        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(*text)
                    .cloned()
                    .unwrap_or_else(|| self.fallback.clone())
            })
            .collect())
    }
}

/// Build a record from raw ingredient phrases
pub fn recipe(name: &str, ingredients: &[&str]) -> RecipeRecord {
    RecipeRecord::new(
        name,
        ingredients.iter().map(|s| s.to_string()).collect(),
        None,
        None,
    )
}

/// Corpus plus its embedding matrix under `provider`
pub fn indexed(records: Vec<RecipeRecord>, provider: &dyn EmbeddingProvider) -> (Corpus, EmbeddingMatrix) {
    let corpus = Corpus::from_records(records);
    let matrix = embed_all(provider, &corpus.embedding_texts()).unwrap();
    (corpus, matrix)
}
