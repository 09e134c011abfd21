//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - OpenTelemetry distributed tracing
//! - Tracing span creation utilities

use anyhow::Result;
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::Sampler;
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    // Create the filter based on configuration
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("pantry_match={}", config.log_level).parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    // Add observability-specific log level
    if let Ok(obs_log) = std::env::var("OBSERVABILITY_LOG_LEVEL") {
        filter = filter.add_directive(format!("pantry_match::observability={}", obs_log).parse()?);
    }

    // Pretty for development, JSON for others. Logs go to stderr, stdout carries responses.
    if config.is_development()
        || std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()) == "pretty"
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Initialize OpenTelemetry distributed tracing with configuration
pub async fn init_opentelemetry_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    // Only initialize if OTLP endpoint is configured
    let Some(endpoint) = &config.otlp_endpoint else {
        tracing::info!("OpenTelemetry tracing disabled (no OTLP endpoint configured)");
        return Ok(());
    };

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()?;

    let sampler = if config.enable_trace_sampling {
        Sampler::TraceIdRatioBased(config.trace_sampling_ratio)
    } else {
        Sampler::AlwaysOn
    };

    let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .with_sampler(sampler)
        .build();

    global::set_tracer_provider(tracer_provider);

    tracing::info!(
        otlp_endpoint = %endpoint,
        trace_sampling_enabled = %config.enable_trace_sampling,
        trace_sampling_ratio = %config.trace_sampling_ratio,
        "OpenTelemetry tracing initialized with OTLP export"
    );
    Ok(())
}

/// Create a span for corpus loading and indexing
pub fn corpus_span(operation: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "corpus_operation",
        operation = operation,
        path = path,
        component = "corpus"
    )
}

/// Create a span for embedding provider calls
pub fn embedding_span(provider: &str, batch_size: usize) -> tracing::Span {
    tracing::debug_span!(
        "embedding_operation",
        provider = provider,
        batch_size = batch_size,
        component = "embedding"
    )
}

/// Create a span for a single recommendation request
pub fn ranking_span(ingredient_count: usize, top_n: i64, max_missing: i64) -> tracing::Span {
    tracing::info_span!(
        "ranking_operation",
        ingredient_count = ingredient_count,
        top_n = top_n,
        max_missing = max_missing,
        component = "ranker"
    )
}
