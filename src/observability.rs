//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels
//! - Distributed tracing with OpenTelemetry
//! - Metrics collection and Prometheus export
//! - Liveness and readiness endpoints for the recommender

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use anyhow::Result;

use crate::observability_config::ObservabilityConfig;

pub use health_checks::ReadinessState;
pub use metrics::{
    record_corpus_embedding_metrics, record_corpus_load_metrics, record_embedding_failure,
    record_embedding_metrics, record_query_cache_metrics, record_recommendation_metrics,
    record_search_metrics, update_circuit_breaker_state,
};
pub use tracing_mod::{corpus_span, embedding_span, ranking_span};

/// Initialize the complete observability stack with custom configuration
///
/// Logging is always installed. The Prometheus recorder and its HTTP server
/// are only started when metrics export is enabled; `readiness` backs the
/// `/health/ready` probe.
pub async fn init_observability_with_config(
    config: &ObservabilityConfig,
    readiness: ReadinessState,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // Initialize tracing first
    tracing_mod::init_tracing_with_config(config)?;

    // Initialize OpenTelemetry tracing
    tracing_mod::init_opentelemetry_tracing_with_config(config).await?;

    if config.enable_metrics_export {
        let metrics_handle = metrics::init_metrics_with_config(config)?;
        metrics::start_metrics_server_with_health_checks(
            metrics_handle,
            config.metrics_port,
            readiness,
        )
        .await?;
    } else {
        tracing::info!("Metrics export disabled");
    }

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_port = %config.metrics_port,
        "Observability stack initialized successfully"
    );
    Ok(())
}
