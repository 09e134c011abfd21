//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Prometheus recorder setup
//! - The metrics and health check HTTP server
//! - Metrics recording functions for corpus, embedding and ranking work

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;

use super::health_checks::{perform_readiness_checks, ReadinessState};
use crate::observability_config::ObservabilityConfig;

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let mut builder = PrometheusBuilder::new();
    for (key, value) in &config.tags {
        builder = builder.add_global_label(key.clone(), value.clone());
    }
    let handle = builder.install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        global_labels = config.tags.len(),
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Serve `/metrics`, `/health/live` and `/health/ready` on the given port
pub async fn start_metrics_server_with_health_checks(
    metrics_handle: PrometheusHandle,
    port: u16,
    readiness: ReadinessState,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting metrics server with health checks on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let metrics_handle = metrics_handle.clone();
                    let readiness = readiness.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                let readiness = readiness.clone();
                                async move {
                                    match (req.method(), req.uri().path()) {
                                        (&hyper::Method::GET, "/metrics") => {
                                            let mut response =
                                                hyper::Response::new(metrics_handle.render());
                                            response.headers_mut().insert(
                                                "content-type",
                                                hyper::header::HeaderValue::from_static(
                                                    "text/plain; version=0.0.4; charset=utf-8",
                                                ),
                                            );
                                            Ok::<_, std::convert::Infallible>(response)
                                        }
                                        (&hyper::Method::GET, "/health/live") => {
                                            Ok(hyper::Response::new("OK".to_string()))
                                        }
                                        (&hyper::Method::GET, "/health/ready") => {
                                            match perform_readiness_checks(&readiness) {
                                                Ok(()) => Ok(hyper::Response::new(format!(
                                                    "OK recipes_loaded={}",
                                                    readiness.recipes_loaded()
                                                ))),
                                                Err(e) => {
                                                    let mut response = hyper::Response::new(
                                                        format!("NOT READY: {}", e),
                                                    );
                                                    *response.status_mut() =
                                                        hyper::StatusCode::SERVICE_UNAVAILABLE;
                                                    Ok(response)
                                                }
                                            }
                                        }
                                        _ => {
                                            let mut response =
                                                hyper::Response::new("Not Found".to_string());
                                            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
                                            Ok(response)
                                        }
                                    }
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            tracing::error!("Error serving connection: {:?}", err);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                }
            }
        }
    });

    Ok(())
}

/// Record corpus loading metrics
pub fn record_corpus_load_metrics(
    duration: Duration,
    records_read: usize,
    records_kept: usize,
    records_without_ingredients: usize,
) {
    metrics::counter!("corpus_loads_total").increment(1);
    metrics::histogram!("corpus_load_duration_seconds").record(duration.as_secs_f64());
    metrics::gauge!("corpus_recipes_loaded").set(records_kept as f64);
    metrics::counter!("corpus_records_read_total").increment(records_read as u64);
    metrics::counter!("corpus_records_without_ingredients_total")
        .increment(records_without_ingredients as u64);
}

/// Record the one-time corpus embedding pass
pub fn record_corpus_embedding_metrics(duration: Duration, recipe_count: usize, dimensions: usize) {
    metrics::histogram!("corpus_embedding_duration_seconds").record(duration.as_secs_f64());
    metrics::gauge!("corpus_embedding_dimensions").set(dimensions as f64);

    // Throughput metrics (recipes embedded per second)
    let throughput = if duration.as_secs_f64() > 0.0 {
        recipe_count as f64 / duration.as_secs_f64()
    } else {
        0.0
    };
    metrics::histogram!("corpus_embedding_throughput_per_sec").record(throughput);
}

/// Record an embedding provider call
pub fn record_embedding_metrics(provider: &str, duration: Duration, input_count: usize) {
    let provider = provider.to_string();
    metrics::counter!("embedding_requests_total", "provider" => provider.clone()).increment(1);
    metrics::histogram!("embedding_duration_seconds", "provider" => provider.clone())
        .record(duration.as_secs_f64());
    metrics::histogram!("embedding_batch_size", "provider" => provider)
        .record(input_count as f64);
}

/// Record a failed embedding provider call
pub fn record_embedding_failure(provider: &str, reason: &str) {
    let provider = provider.to_string();
    let reason = reason.to_string();
    metrics::counter!("embedding_failures_total", "provider" => provider, "reason" => reason)
        .increment(1);
}

/// Record a query embedding cache lookup
pub fn record_query_cache_metrics(hit: bool) {
    metrics::counter!("query_cache_lookups_total", "result" => if hit { "hit" } else { "miss" })
        .increment(1);
}

/// Record a completed recommendation request
pub fn record_recommendation_metrics(
    duration: Duration,
    ingredient_count: usize,
    candidates_kept: usize,
    results_returned: usize,
) {
    metrics::counter!("recommendation_requests_total").increment(1);
    metrics::histogram!("recommendation_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("recommendation_ingredient_count").record(ingredient_count as f64);
    metrics::histogram!("recommendation_candidates_kept").record(candidates_kept as f64);
    metrics::histogram!("recommendation_results_returned").record(results_returned as f64);
    if results_returned == 0 {
        metrics::counter!("recommendation_empty_results_total").increment(1);
    }
}

/// Record a recipe name search
pub fn record_search_metrics(duration: Duration, results_returned: usize) {
    metrics::counter!("search_requests_total").increment(1);
    metrics::histogram!("search_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("search_results_returned").record(results_returned as f64);
}

/// Update circuit breaker state metric
pub fn update_circuit_breaker_state(is_open: bool) {
    metrics::gauge!("embedding_circuit_breaker_state").set(if is_open { 1.0 } else { 0.0 });
}
