//! # Pantry Match
//!
//! Recommends recipes from the ingredients a user has on hand. Recipe and
//! user ingredients are normalized, scored semantically against a
//! precomputed corpus embedding, reconciled with direct and substitution
//! matches, and returned as a ranked, explainable list.

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod context;
pub mod corpus;
pub mod embedding;
pub mod enrichment;
pub mod errors;
pub mod matcher;
pub mod normalizer;
pub mod nutrition;
pub mod observability;
pub mod observability_config;
pub mod ranker;
pub mod substitutions;

// Re-export types for easier access
pub use context::{RecommendRequest, RecommendResponse, RecommenderContext};
pub use corpus::{Corpus, RecipeRecord};
pub use embedding::{EmbeddingMatrix, EmbeddingProvider};
pub use errors::{AppError, AppResult};
pub use matcher::{IngredientMatch, Matcher};
pub use ranker::{MatchResult, Ranker, RankingOutcome};
