//! Remote embedding provider for OpenAI-compatible `/embeddings` endpoints.
//!
//! Inputs are sent in batches of at most `batch_size`. Rate limits, server
//! errors and transport failures are retried with exponential backoff and
//! jitter; repeated failures open a circuit breaker that rejects calls until
//! it cools down.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{EmbeddingConfig, RecoveryConfig};
use crate::errors::{error_logging, AppError, AppResult};

use super::EmbeddingProvider;

/// Blocking embeddings client with retries and a circuit breaker
#[derive(Debug)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    recovery: RecoveryConfig,
    breaker: CircuitBreaker,
}

impl HttpEmbedder {
    /// Build a client from embedding configuration
    ///
    /// Must not be called from inside an async task; the blocking client owns
    /// its own runtime.
    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        let base_url = config
            .endpoint
            .as_deref()
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
            .ok_or_else(|| {
                AppError::Config("EMBEDDING_ENDPOINT must be an http(s) URL".to_string())
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let auth = format!("Bearer {}", key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|_| AppError::Config("invalid embedding API key".to_string()))?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
            recovery: config.recovery.clone(),
            breaker: CircuitBreaker::new(&config.recovery),
        })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn embed_chunk(&self, inputs: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 1u32;
        loop {
            match self.send_once(inputs) {
                Ok(vectors) => return Ok(vectors),
                Err(failure) if failure.retryable && attempt < self.recovery.max_retries => {
                    let delay = calculate_retry_delay(attempt, &self.recovery);
                    tracing::warn!(
                        attempt,
                        max_retries = self.recovery.max_retries,
                        delay_ms = delay,
                        error = %failure.error,
                        "Embedding request failed, retrying"
                    );
                    crate::observability::record_embedding_failure(self.name(), "retry");
                    thread::sleep(Duration::from_millis(delay));
                    attempt += 1;
                }
                Err(failure) => {
                    error_logging::log_embedding_error(
                        &failure.error,
                        "embed_chunk",
                        self.name(),
                        Some(inputs.len()),
                        Some(attempt),
                    );
                    crate::observability::record_embedding_failure(self.name(), "exhausted");
                    return Err(failure.error);
                }
            }
        }
    }

    fn send_once(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AttemptFailure> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|err| AttemptFailure {
                retryable: err.is_timeout() || err.is_connect() || err.is_request(),
                error: AppError::Network(format!("embedding request failed: {}", err)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AttemptFailure {
                retryable: should_retry(status),
                error: AppError::Network(format!(
                    "embeddings endpoint returned {}: {}",
                    status, body
                )),
            });
        }

        let mut parsed: EmbeddingResponse = response.json().map_err(|err| AttemptFailure {
            retryable: false,
            error: AppError::Embedding(format!("failed to parse embedding response: {}", err)),
        })?;
        parsed.data.sort_by_key(|entry| entry.index);

        let invalid = |message: String| AttemptFailure {
            retryable: false,
            error: AppError::Embedding(message),
        };
        if parsed.data.len() != inputs.len() {
            return Err(invalid(format!(
                "endpoint returned {} embeddings for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }
        if let Some(entry) = parsed
            .data
            .iter()
            .find(|entry| entry.embedding.len() != self.dimensions)
        {
            return Err(invalid(format!(
                "endpoint returned {} dimensions, expected {}",
                entry.embedding.len(),
                self.dimensions
            )));
        }

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

impl EmbeddingProvider for HttpEmbedder {
    fn name(&self) -> &str {
        "http"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn encode_batch(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let _span = crate::observability::embedding_span(self.name(), texts.len()).entered();
        let mut vectors = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            if self.breaker.is_open() {
                crate::observability::record_embedding_failure(self.name(), "circuit_open");
                return Err(AppError::Embedding(
                    "embedding circuit breaker is open, refusing request".to_string(),
                ));
            }

            let start = Instant::now();
            match self.embed_chunk(chunk) {
                Ok(mut chunk_vectors) => {
                    self.breaker.record_success();
                    crate::observability::record_embedding_metrics(
                        self.name(),
                        start.elapsed(),
                        chunk.len(),
                    );
                    vectors.append(&mut chunk_vectors);
                }
                Err(err) => {
                    self.breaker.record_failure();
                    return Err(err);
                }
            }
        }

        Ok(vectors)
    }
}

struct AttemptFailure {
    retryable: bool,
    error: AppError,
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Calculate the delay before retry `attempt` (1-based) with exponential backoff and jitter
pub fn calculate_retry_delay(attempt: u32, recovery: &RecoveryConfig) -> u64 {
    let exponent = attempt.saturating_sub(1).min(20);
    let delay = recovery
        .base_retry_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(recovery.max_retry_delay_ms);

    // Add some jitter to prevent thundering herd
    let jitter = if delay >= 4 {
        rand::random::<u64>() % (delay / 4)
    } else {
        0
    };
    delay + jitter
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    #[serde(borrow)]
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
