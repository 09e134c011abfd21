//! # Ranker
//!
//! Combines the semantic score of every recipe with its lexical match and
//! returns the best candidates.
//!
//! For each recipe `i`:
//!
//! ```text
//! semantic[i]  = cosine(query_vector, corpus_vector[i])
//! match_ratio  = |present| / |recipe terms|        (0 when the recipe has no terms)
//! boosted[i]   = semantic[i] * (1 + match_ratio)
//! keep iff (|present| > 0 || semantic[i] > threshold) && |missing| <= max_missing
//! ```
//!
//! Survivors are sorted by `(match_count, boosted)` descending. The sort is
//! stable, so ties keep corpus order. The list is then cut to `top_n`.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::embedding::{EmbeddingMatrix, EmbeddingProvider};
use crate::errors::{AppError, AppResult};
use crate::matcher::Matcher;
use crate::normalizer::clean_list;

/// Raw cosine score above which a recipe survives without any lexical match
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.5;

/// One ranked recipe with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position of the recipe in the corpus
    pub recipe_index: usize,
    pub name: String,
    /// Raw ingredient phrases of the recipe
    pub ingredients: Vec<String>,
    pub cuisine: Option<String>,
    pub tags: Option<String>,
    /// Covered recipe terms, forward substitutions annotated `"r(sub->u)"`
    pub present: Vec<String>,
    pub missing: Vec<String>,
    pub substitutions_used: BTreeMap<String, String>,
    /// Raw cosine similarity between query and recipe
    pub semantic_score: f32,
    /// Semantic score boosted by the match ratio; the public `score`
    pub boosted_score: f32,
    pub match_count: usize,
}

impl MatchResult {
    /// Whole percentage of raw ingredients covered, rounded down
    pub fn match_percentage(&self) -> u32 {
        if self.ingredients.is_empty() {
            return 0;
        }
        ((self.match_count * 100) / self.ingredients.len()) as u32
    }
}

/// Everything one ranking pass produced
#[derive(Debug, Clone, Default)]
pub struct RankingOutcome {
    /// Cleaned, non-empty user terms in input order
    pub user_terms: Vec<String>,
    /// Text that was embedded as the query
    pub query_text: String,
    /// Ranked results, at most `top_n`
    pub results: Vec<MatchResult>,
    /// Records that passed the inclusion filter before truncation
    pub candidates_kept: usize,
    /// One vector per user term, computed alongside the query vector
    ///
    /// Not used by the scoring formula; exposed for callers that want
    /// per-ingredient semantics.
    pub user_term_vectors: Option<Vec<Vec<f32>>>,
}

/// Scores recipes against a user's ingredients
#[derive(Debug, Clone, Copy)]
pub struct Ranker<'a> {
    matcher: Matcher<'a>,
    semantic_threshold: f32,
}

impl Default for Ranker<'static> {
    fn default() -> Self {
        Self::new(Matcher::default(), DEFAULT_SEMANTIC_THRESHOLD)
    }
}

impl<'a> Ranker<'a> {
    /// Create a ranker with a matcher and semantic inclusion threshold
    pub fn new(matcher: Matcher<'a>, semantic_threshold: f32) -> Self {
        Self {
            matcher,
            semantic_threshold,
        }
    }

    /// Rank every corpus record for the given user ingredients
    ///
    /// User ingredients that clean to an empty string are dropped and never
    /// count as a match.
    ///
    /// `top_n <= 0` or `max_missing < 0` yield an empty outcome without
    /// calling the embedding provider. Embedding failures are returned as
    /// errors; nothing else is.
    pub fn rank<S: AsRef<str>>(
        &self,
        user_ingredients: &[S],
        corpus: &Corpus,
        embeddings: &EmbeddingMatrix,
        provider: &dyn EmbeddingProvider,
        top_n: i64,
        max_missing: i64,
    ) -> AppResult<RankingOutcome> {
        let start = Instant::now();

        // Terms that clean to nothing would be a substring of every recipe term.
        let user_terms: Vec<String> = clean_list(user_ingredients)
            .into_iter()
            .filter(|term| !term.is_empty())
            .collect();
        let query_text = user_terms.join(", ");

        if top_n <= 0 || max_missing < 0 {
            tracing::debug!(top_n, max_missing, "Out-of-range request, returning no results");
            return Ok(RankingOutcome {
                user_terms,
                query_text,
                ..Default::default()
            });
        }

        if embeddings.len() != corpus.len() {
            return Err(AppError::Internal(format!(
                "embedding matrix has {} rows for {} recipes",
                embeddings.len(),
                corpus.len()
            )));
        }

        let query_vector = provider.encode(&query_text)?;
        if query_vector.len() != embeddings.dimensions() {
            return Err(AppError::Embedding(format!(
                "query vector has {} components, corpus has {}",
                query_vector.len(),
                embeddings.dimensions()
            )));
        }

        let user_term_vectors = if user_terms.is_empty() {
            None
        } else {
            let inputs: Vec<&str> = user_terms.iter().map(String::as_str).collect();
            Some(provider.encode_batch(&inputs)?)
        };

        let scores = embeddings.similarity(&query_vector);
        let max_missing = usize::try_from(max_missing).unwrap_or(usize::MAX);

        let mut results: Vec<MatchResult> = corpus
            .records()
            .iter()
            .zip(scores)
            .enumerate()
            .filter_map(|(recipe_index, (record, semantic_score))| {
                let matched = self
                    .matcher
                    .match_ingredients(&user_terms, &record.clean_ingredients);

                let match_count = matched.match_count();
                let keep = (match_count > 0 || semantic_score > self.semantic_threshold)
                    && matched.missing.len() <= max_missing;
                if !keep {
                    return None;
                }

                Some(MatchResult {
                    recipe_index,
                    name: record.name.clone(),
                    ingredients: record.raw_ingredients.clone(),
                    cuisine: record.cuisine.clone(),
                    tags: record.tags.clone(),
                    boosted_score: boost(
                        semantic_score,
                        match_count,
                        record.clean_ingredients.len(),
                    ),
                    semantic_score,
                    match_count,
                    present: matched.present,
                    missing: matched.missing,
                    substitutions_used: matched.substitutions_used,
                })
            })
            .collect();

        let candidates_kept = results.len();
        results.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| b.boosted_score.total_cmp(&a.boosted_score))
        });
        results.truncate(usize::try_from(top_n).unwrap_or(usize::MAX));

        crate::observability::record_recommendation_metrics(
            start.elapsed(),
            user_terms.len(),
            candidates_kept,
            results.len(),
        );
        tracing::debug!(
            query = %query_text,
            candidates_kept,
            returned = results.len(),
            duration_ms = start.elapsed().as_millis(),
            "Ranking complete"
        );

        Ok(RankingOutcome {
            user_terms,
            query_text,
            results,
            candidates_kept,
            user_term_vectors,
        })
    }
}

/// `semantic * (1 + present / total)`, or the semantic score itself when `total == 0`
pub fn boost(semantic_score: f32, present: usize, total: usize) -> f32 {
    if total == 0 {
        return semantic_score;
    }
    let match_ratio = present as f32 / total as f32;
    semantic_score * (1.0 + match_ratio)
}

/// Rank with the built-in substitution table and default threshold
pub fn rank<S: AsRef<str>>(
    user_ingredients: &[S],
    corpus: &Corpus,
    embeddings: &EmbeddingMatrix,
    provider: &dyn EmbeddingProvider,
    top_n: i64,
    max_missing: i64,
) -> AppResult<RankingOutcome> {
    Ranker::default().rank(
        user_ingredients,
        corpus,
        embeddings,
        provider,
        top_n,
        max_missing,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::RecipeRecord;
    use crate::embedding::{embed_all, HashingEmbedder};

    fn corpus() -> Corpus {
        Corpus::from_records(vec![
            RecipeRecord::new(
                "Tomato Rice",
                vec!["rice".into(), "onion".into(), "tomato".into()],
                Some("Indian".into()),
                None,
            ),
            RecipeRecord::new("Plain Rice", vec!["rice".into()], None, None),
            RecipeRecord::new("Empty", vec![], None, None),
        ])
    }

    #[test]
    fn test_boost() {
        assert_eq!(boost(0.4, 0, 0), 0.4);
        assert!((boost(0.4, 1, 2) - 0.6).abs() < 1e-6);
        assert!((boost(0.5, 3, 3) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_boost_never_decreases_with_more_matches() {
        for semantic in [0.01f32, 0.2, 0.5, 0.73, 1.0] {
            for total in 1..=12usize {
                let mut previous = boost(semantic, 0, total);
                assert_eq!(previous, semantic);
                for present in 1..=total {
                    let boosted = boost(semantic, present, total);
                    assert!(
                        boosted >= previous,
                        "boost fell from {} to {} at {}/{} for {}",
                        previous,
                        boosted,
                        present,
                        total,
                        semantic
                    );
                    assert!(boosted >= semantic && boosted <= 2.0 * semantic + 1e-6);
                    previous = boosted;
                }
            }
        }
    }

    #[test]
    fn test_match_percentage_rounds_down() {
        let provider = HashingEmbedder::new(64).unwrap();
        let corpus = corpus();
        let matrix = embed_all(&provider, &corpus.embedding_texts()).unwrap();
        let outcome = rank(&["rice"], &corpus, &matrix, &provider, 10, 2).unwrap();
        let tomato_rice = outcome
            .results
            .iter()
            .find(|r| r.name == "Tomato Rice")
            .unwrap();
        assert_eq!(tomato_rice.match_percentage(), 33);
    }

    #[test]
    fn test_out_of_range_parameters() {
        let provider = HashingEmbedder::new(64).unwrap();
        let corpus = corpus();
        let matrix = embed_all(&provider, &corpus.embedding_texts()).unwrap();
        assert!(rank(&["rice"], &corpus, &matrix, &provider, 0, 2)
            .unwrap()
            .results
            .is_empty());
        assert!(rank(&["rice"], &corpus, &matrix, &provider, 5, -1)
            .unwrap()
            .results
            .is_empty());
    }

    #[test]
    fn test_blank_user_terms_are_dropped() {
        let provider = HashingEmbedder::new(64).unwrap();
        let corpus = corpus();
        let matrix = embed_all(&provider, &corpus.embedding_texts()).unwrap();
        let outcome = rank(&["  ", "2 cups", "rice"], &corpus, &matrix, &provider, 10, 5).unwrap();
        assert_eq!(outcome.user_terms, vec!["rice"]);
        assert_eq!(outcome.query_text, "rice");
        assert_eq!(outcome.user_term_vectors.map(|v| v.len()), Some(1));

        // a blank term is not a substring match for every recipe ingredient
        let tomato_rice = outcome
            .results
            .iter()
            .find(|r| r.name == "Tomato Rice")
            .unwrap();
        assert_eq!(tomato_rice.present, vec!["rice"]);
        assert_eq!(tomato_rice.missing, vec!["onion", "tomato"]);
    }

    #[test]
    fn test_mismatched_matrix_is_an_error() {
        let provider = HashingEmbedder::new(8).unwrap();
        let corpus = corpus();
        let matrix = EmbeddingMatrix::from_rows(vec![vec![0.0; 8]], 8).unwrap();
        assert!(rank(&["rice"], &corpus, &matrix, &provider, 5, 2).is_err());
    }
}
