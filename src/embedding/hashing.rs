//! Local feature-hashing embedder.
//!
//! Each word, word bigram and padded character trigram is hashed into a
//! fixed number of buckets with a hash-derived sign, then the vector is
//! L2-normalized. Texts sharing vocabulary land close together; unrelated
//! texts are near-orthogonal. No model files, no network.

use std::time::Instant;

use crate::errors::{AppError, AppResult};

use super::EmbeddingProvider;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;
const TRIGRAM_WEIGHT: f32 = 0.25;

/// Deterministic embedder based on the hashing trick
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing `dimensions`-long vectors
    pub fn new(dimensions: usize) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::Validation(
                "hashing embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    /// Embed one text without going through the trait
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let words = tokenize(text);

        for word in &words {
            self.accumulate(&mut vector, word, 0, WORD_WEIGHT);

            let padded: Vec<char> = format!("#{}#", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut vector, &trigram, 1, TRIGRAM_WEIGHT);
            }
        }

        for pair in words.windows(2) {
            let bigram = format!("{}_{}", pair[0], pair[1]);
            self.accumulate(&mut vector, &bigram, 2, BIGRAM_WEIGHT);
        }

        normalize(&mut vector);
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, seed: u64, weight: f32) {
        let hash = fnv1a(feature, seed);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn encode_batch(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let start = Instant::now();
        let vectors = texts.iter().map(|text| self.embed_text(text)).collect();
        crate::observability::record_embedding_metrics(self.name(), start.elapsed(), texts.len());
        Ok(vectors)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(String::from)
        .collect()
}

fn fnv1a(feature: &str, seed: u64) -> u64 {
    let mut hash = FNV_OFFSET ^ seed.wrapping_mul(FNV_PRIME);
    for byte in feature.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::new(64).unwrap();
        assert_eq!(embedder.embed_text("rice, onion"), embedder.embed_text("rice, onion"));
    }

    #[test]
    fn test_unit_norm_and_empty() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let vector = embedder.embed_text("basmati rice");
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);

        let empty = embedder.embed_text("");
        assert!(empty.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let query = embedder.embed_text("rice, onion, tomato");
        let close = embedder.embed_text("rice, onion, tomato, salt");
        let far = embedder.embed_text("chocolate, vanilla, cream");
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[test]
    fn test_batch_matches_single() {
        let embedder = HashingEmbedder::new(16).unwrap();
        let batch = embedder.encode_batch(&["rice", "dal"]).unwrap();
        assert_eq!(batch[1], embedder.encode("dal").unwrap());
    }
}
