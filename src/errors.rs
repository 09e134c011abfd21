//! # Application Error Types
//!
//! This module defines common error types used throughout the pantry-match crate.
//! It provides structured error handling for corpus loading, embedding and ranking.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Corpus loading errors (unreadable file, missing columns)
    Corpus(String),
    /// Embedding provider errors (model unavailable, dimension mismatch)
    Embedding(String),
    /// Validation errors (request inputs, record invariants)
    Validation(String),
    /// File system errors
    FileSystem(String),
    /// Network/communication errors
    Network(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Corpus(msg) => write!(f, "[CORPUS] {}", msg),
            AppError::Embedding(msg) => write!(f, "[EMBEDDING] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Network(msg) => write!(f, "[NETWORK] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Corpus(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the crate
pub mod error_logging {
    use tracing::error;

    /// Log corpus loading errors with source context
    pub fn log_corpus_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
        record_index: Option<usize>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            record_index = ?record_index,
            "Corpus operation failed"
        );
    }

    /// Log embedding provider errors with batch context
    pub fn log_embedding_error(
        error: &impl std::fmt::Display,
        operation: &str,
        provider: &str,
        batch_size: Option<usize>,
        attempt_count: Option<u32>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            provider = %provider,
            batch_size = ?batch_size,
            attempt_count = ?attempt_count,
            "Embedding operation failed"
        );
    }

    /// Log recommendation request errors with request-specific context
    pub fn log_request_error(
        error: &impl std::fmt::Display,
        operation: &str,
        ingredient_count: usize,
        top_n: i64,
        max_missing: i64,
    ) {
        error!(
            error = %error,
            operation = %operation,
            ingredient_count = %ingredient_count,
            top_n = %top_n,
            max_missing = %max_missing,
            "Recommendation request failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_tags() {
        assert_eq!(
            AppError::Embedding("model unavailable".to_string()).to_string(),
            "[EMBEDDING] model unavailable"
        );
        assert_eq!(
            AppError::Corpus("missing name".to_string()).to_string(),
            "[CORPUS] missing name"
        );
    }

    #[test]
    fn test_io_error_maps_to_filesystem() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert!(matches!(AppError::from(io), AppError::FileSystem(_)));
    }
}
