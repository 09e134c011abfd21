//! # Unified Application Configuration
//!
//! This module provides a centralized configuration system that consolidates
//! corpus, embedding, ranking, server and observability settings into a single
//! structured configuration object loaded from environment variables.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Read an environment variable with a default, mapping parse failures to config errors
fn env_or<T: FromStr>(key: &str, default: &str) -> AppResult<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a valid value", key)))
}

/// Corpus source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Path to a JSON array or JSON Lines recipe file
    pub path: String,
    /// Keep only the first N records (0 keeps everything)
    pub limit: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: "data/recipes.json".to_string(),
            limit: 0,
        }
    }
}

impl CorpusConfig {
    /// Validate corpus configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.path.trim().is_empty() {
            return Err(AppError::Config("Corpus path cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Retry and circuit breaker settings for remote embedding calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Maximum number of attempts per batch
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Consecutive failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// Seconds the circuit stays open before allowing a test request
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 500,
            max_retry_delay_ms: 8000,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

impl RecoveryConfig {
    /// Validate recovery configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.max_retries == 0 {
            return Err(AppError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }
        if self.base_retry_delay_ms == 0 {
            return Err(AppError::Config(
                "base_retry_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_retry_delay_ms < self.base_retry_delay_ms {
            return Err(AppError::Config(format!(
                "max_retry_delay_ms ({}) must be >= base_retry_delay_ms ({})",
                self.max_retry_delay_ms, self.base_retry_delay_ms
            )));
        }
        if self.circuit_breaker_threshold == 0 {
            return Err(AppError::Config(
                "circuit_breaker_threshold must be greater than 0".to_string(),
            ));
        }
        if self.circuit_breaker_reset_secs == 0 {
            return Err(AppError::Config(
                "circuit_breaker_reset_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which embedding backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local feature-hashing embedder, no network
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint
    Http,
}

impl FromStr for EmbeddingProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hashing" | "local" => Ok(Self::Hashing),
            "http" | "remote" => Ok(Self::Http),
            other => Err(AppError::Config(format!(
                "Unknown embedding provider '{}', expected 'hashing' or 'http'",
                other
            ))),
        }
    }
}

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend selection
    pub provider: EmbeddingProviderKind,
    /// Vector length produced by the provider
    pub dimensions: usize,
    /// Base URL of the remote endpoint (http provider only)
    pub endpoint: Option<String>,
    /// Model name sent to the remote endpoint
    pub model: String,
    /// API key for the remote endpoint
    pub api_key: Option<String>,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Maximum inputs per remote request
    pub batch_size: usize,
    /// TTL of cached query embeddings in seconds (0 disables the cache)
    pub query_cache_ttl_secs: u64,
    /// Retry and circuit breaker settings
    pub recovery: RecoveryConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hashing,
            dimensions: 384,
            endpoint: None,
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
            timeout_secs: 30,
            batch_size: 64,
            query_cache_ttl_secs: 300,
            recovery: RecoveryConfig::default(),
        }
    }
}

impl EmbeddingConfig {
    /// Validate embedding configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(AppError::Config(
                "Embedding timeout must be between 1 and 300 seconds".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::Config(
                "Embedding model name cannot be empty".to_string(),
            ));
        }

        if self.provider == EmbeddingProviderKind::Http {
            let endpoint = self.endpoint.as_deref().unwrap_or("");
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "Embedding endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }

        self.recovery.validate()
    }
}

/// Default request parameters for ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Results returned when a request does not specify top_n
    pub default_top_n: i64,
    /// Missing-ingredient allowance when a request does not specify max_missing
    pub default_max_missing: i64,
    /// Raw cosine score above which a recipe is kept without lexical matches
    pub semantic_threshold: f32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_top_n: 8,
            default_max_missing: 2,
            semantic_threshold: 0.5,
        }
    }
}

impl RankingConfig {
    /// Validate ranking configuration
    pub fn validate(&self) -> AppResult<()> {
        if !(-1.0..=1.0).contains(&self.semantic_threshold) {
            return Err(AppError::Config(format!(
                "Semantic threshold {} must be within [-1, 1]",
                self.semantic_threshold
            )));
        }
        Ok(())
    }
}

/// Server configuration for health checks and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Metrics and health server port
    pub metrics_port: u16,
    /// Whether to allow privileged ports (< 1024)
    pub allow_privileged_ports: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            allow_privileged_ports: false,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> AppResult<()> {
        if !self.allow_privileged_ports && self.metrics_port < 1024 {
            return Err(AppError::Config(format!(
                "Metrics port {} is privileged. Set allow_privileged_ports=true or use port >= 1024",
                self.metrics_port
            )));
        }
        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Corpus configuration
    pub corpus: CorpusConfig,
    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,
    /// Ranking defaults
    pub ranking: RankingConfig,
    /// Server configuration
    pub server: ServerConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        // Corpus
        if let Ok(path) = env::var("CORPUS_PATH") {
            config.corpus.path = path;
        }
        config.corpus.limit = env_or("CORPUS_LIMIT", "0")?;

        // Embedding provider
        config.embedding.provider = env_or("EMBEDDING_PROVIDER", "hashing")?;
        config.embedding.dimensions = env_or("EMBEDDING_DIMENSIONS", "384")?;
        config.embedding.endpoint = env::var("EMBEDDING_ENDPOINT").ok();
        if let Ok(model) = env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        config.embedding.api_key = env::var("EMBEDDING_API_KEY").ok();
        config.embedding.timeout_secs = env_or("EMBEDDING_TIMEOUT_SECS", "30")?;
        config.embedding.batch_size = env_or("EMBEDDING_BATCH_SIZE", "64")?;
        config.embedding.query_cache_ttl_secs = env_or("QUERY_CACHE_TTL_SECS", "300")?;
        config.embedding.recovery.max_retries = env_or("EMBEDDING_MAX_RETRIES", "3")?;

        // Ranking defaults
        config.ranking.default_top_n = env_or("DEFAULT_TOP_N", "8")?;
        config.ranking.default_max_missing = env_or("DEFAULT_MAX_MISSING", "2")?;
        config.ranking.semantic_threshold = env_or("SEMANTIC_THRESHOLD", "0.5")?;

        // Server
        config.server.metrics_port = env_or("METRICS_PORT", "9090")?;
        config.server.allow_privileged_ports = env::var("ALLOW_PRIVILEGED_PORTS")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        config.observability = ObservabilityConfig::from_env();
        config.observability.metrics_port = config.server.metrics_port;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.corpus.validate()?;
        self.embedding.validate()?;
        self.ranking.validate()?;
        self.server.validate()?;
        self.observability
            .validate()
            .map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: corpus_path={}, corpus_limit={}, embedding_provider={:?}, embedding_model={}, embedding_api_key={}, dimensions={}, top_n={}, max_missing={}, metrics_port={}",
            self.corpus.path,
            self.corpus.limit,
            self.embedding.provider,
            self.embedding.model,
            if self.embedding.api_key.is_some() { "[REDACTED]" } else { "none" },
            self.embedding.dimensions,
            self.ranking.default_top_n,
            self.ranking.default_max_missing,
            self.server.metrics_port
        )
    }
}
