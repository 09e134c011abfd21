//! # Recommender Context
//!
//! The immutable state shared by every request: the corpus, its embedding
//! matrix, the embedding provider used for queries, and the enrichers. Built
//! once at startup and shared behind an `Arc`; nothing in it is mutated
//! afterwards except the query embedding cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CachedEmbedder;
use crate::config::{AppConfig, RankingConfig};
use crate::corpus::{Corpus, RecipeRecord};
use crate::embedding::{self, EmbeddingMatrix, EmbeddingProvider};
use crate::enrichment::{self, Enricher, RecommendedRecipe};
use crate::errors::{error_logging, AppResult};
use crate::matcher::Matcher;
use crate::ranker::Ranker;
use crate::substitutions::SubstitutionIndex;

/// One recommendation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Free-text ingredients the user has
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Maximum results; configured default when absent
    #[serde(default)]
    pub top_n: Option<i64>,
    /// Maximum missing ingredients per recipe; configured default when absent
    #[serde(default)]
    pub max_missing: Option<i64>,
}

/// Ranked, enriched recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recipes: Vec<RecommendedRecipe>,
    /// Records that passed the inclusion filter before truncation
    pub total_candidates: usize,
}

/// Summary reported by health probes and the driver on startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub status: String,
    pub recipes_loaded: usize,
    pub embedding_provider: String,
    pub embedding_dimensions: usize,
    pub built_at: DateTime<Utc>,
    pub build_duration_ms: u64,
}

/// Shared, read-only recommender state
pub struct RecommenderContext {
    corpus: Corpus,
    embeddings: EmbeddingMatrix,
    provider: CachedEmbedder,
    enrichers: Vec<Box<dyn Enricher>>,
    ranking: RankingConfig,
    built_at: DateTime<Utc>,
    build_duration: Duration,
}

impl RecommenderContext {
    /// Embed the whole corpus and assemble the context
    ///
    /// Any embedding failure here is fatal and returned to the caller.
    pub fn build(
        corpus: Corpus,
        provider: Arc<dyn EmbeddingProvider>,
        ranking: RankingConfig,
        query_cache_ttl: Duration,
    ) -> AppResult<Self> {
        let start = Instant::now();
        let embeddings = embedding::embed_all(provider.as_ref(), &corpus.embedding_texts())
            .map_err(|e| {
                error_logging::log_embedding_error(
                    &e,
                    "build_corpus_embeddings",
                    provider.name(),
                    Some(corpus.len()),
                    None,
                );
                e
            })?;

        let context = Self {
            corpus,
            embeddings,
            provider: CachedEmbedder::new(provider, query_cache_ttl),
            enrichers: enrichment::default_enrichers(),
            ranking,
            built_at: Utc::now(),
            build_duration: start.elapsed(),
        };
        tracing::info!(
            recipes = context.corpus.len(),
            provider = context.provider.name(),
            dimensions = context.embeddings.dimensions(),
            build_ms = context.build_duration.as_millis(),
            "Recommender context ready"
        );
        Ok(context)
    }

    /// Load the configured corpus, construct the configured provider and build
    ///
    /// Blocking; async callers should run it on a blocking worker.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let corpus = Corpus::load(&config.corpus.path, config.corpus.limit)?;
        let provider = embedding::build_provider(&config.embedding)?;
        Self::build(
            corpus,
            provider,
            config.ranking.clone(),
            Duration::from_secs(config.embedding.query_cache_ttl_secs),
        )
    }

    /// Replace the enrichers attached to every result
    pub fn with_enrichers(mut self, enrichers: Vec<Box<dyn Enricher>>) -> Self {
        self.enrichers = enrichers;
        self
    }

    /// Rank and enrich recipes for one request
    pub fn recommend(&self, request: &RecommendRequest) -> AppResult<RecommendResponse> {
        let top_n = request.top_n.unwrap_or(self.ranking.default_top_n);
        let max_missing = request.max_missing.unwrap_or(self.ranking.default_max_missing);
        let _span =
            crate::observability::ranking_span(request.ingredients.len(), top_n, max_missing)
                .entered();

        let ranker = Ranker::new(
            Matcher::new(SubstitutionIndex::builtin()),
            self.ranking.semantic_threshold,
        );
        let outcome = ranker
            .rank(
                &request.ingredients,
                &self.corpus,
                &self.embeddings,
                &self.provider,
                top_n,
                max_missing,
            )
            .map_err(|e| {
                error_logging::log_request_error(
                    &e,
                    "recommend",
                    request.ingredients.len(),
                    top_n,
                    max_missing,
                );
                e
            })?;

        Ok(RecommendResponse {
            total_candidates: outcome.candidates_kept,
            recipes: enrichment::enrich_all(outcome.results, &self.enrichers),
        })
    }

    /// Case-insensitive name search over the corpus
    pub fn search_by_name(&self, query: &str, limit: usize) -> Vec<&RecipeRecord> {
        let start = Instant::now();
        let results = self.corpus.search_by_name(query, limit);
        crate::observability::record_search_metrics(start.elapsed(), results.len());
        results
    }

    /// Health summary of the built context
    pub fn health(&self) -> HealthSummary {
        HealthSummary {
            status: "ok".to_string(),
            recipes_loaded: self.corpus.len(),
            embedding_provider: self.provider.name().to_string(),
            embedding_dimensions: self.embeddings.dimensions(),
            built_at: self.built_at,
            build_duration_ms: self.build_duration.as_millis() as u64,
        }
    }

    /// The loaded corpus
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Query embedding cache statistics
    pub fn query_cache_stats(&self) -> crate::cache::CacheStats {
        self.provider.cache().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;

    fn context() -> RecommenderContext {
        let corpus = Corpus::from_records(vec![
            RecipeRecord::new(
                "Tomato Rice",
                vec!["2 cups rice".into(), "1 onion".into(), "2 tomatoes".into()],
                Some("Indian".into()),
                None,
            ),
            RecipeRecord::new("Kheer", vec!["milk".into(), "rice".into(), "sugar".into()], None, None),
        ]);
        RecommenderContext::build(
            corpus,
            Arc::new(HashingEmbedder::new(64).unwrap()),
            RankingConfig::default(),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_apply_when_request_omits_them() {
        let ctx = context();
        let request = RecommendRequest {
            ingredients: vec!["rice".into()],
            ..Default::default()
        };
        let response = ctx.recommend(&request).unwrap();
        assert_eq!(response.recipes.len(), 2);
        assert!(response.recipes.iter().all(|r| r.extras.contains_key("nutrition")));
    }

    #[test]
    fn test_repeated_query_hits_cache() {
        let ctx = context();
        let request = RecommendRequest {
            ingredients: vec!["rice".into(), "milk".into()],
            top_n: Some(1),
            max_missing: Some(2),
        };
        let first = ctx.recommend(&request).unwrap();
        let second = ctx.recommend(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.query_cache_stats().hits, 1);
    }

    #[test]
    fn test_health_and_search() {
        let ctx = context();
        let health = ctx.health();
        assert_eq!(health.recipes_loaded, 2);
        assert_eq!(health.embedding_dimensions, 64);
        assert_eq!(health.embedding_provider, "hashing");
        assert_eq!(ctx.search_by_name("kheer", 5).len(), 1);
    }

    #[test]
    fn test_request_deserializes_with_missing_fields() {
        let request: RecommendRequest = serde_json::from_str(r#"{"ingredients":["rice"]}"#).unwrap();
        assert_eq!(request.top_n, None);
        let request: RecommendRequest = serde_json::from_str("{}").unwrap();
        assert!(request.ingredients.is_empty());
    }
}
