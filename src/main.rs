use std::sync::Arc;

use anyhow::Result;
use pantry_match::config::AppConfig;
use pantry_match::errors::error_logging;
use pantry_match::observability::{self, ReadinessState};
use pantry_match::{RecommendRequest, RecommenderContext};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

/// Default number of names returned by a search request
const DEFAULT_SEARCH_LIMIT: usize = 20;

/// One line of input: a name search or a recommendation request
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DriverRequest {
    Search {
        search: String,
        #[serde(default = "default_search_limit")]
        limit: usize,
    },
    Recommend(RecommendRequest),
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// Load and validate configuration at startup
fn load_configuration() -> Result<AppConfig> {
    let config = AppConfig::from_env().map_err(|e| {
        error_logging::log_config_error(&e, "environment", "load_configuration");
        anyhow::anyhow!("Configuration loading failed: {}", e)
    })?;

    config.validate().map_err(|e| {
        error_logging::log_config_error(&e, "app_config", "validate_configuration");
        anyhow::anyhow!(
            "Configuration validation failed: {}. Please check your environment variables.",
            e
        )
    })?;

    Ok(config)
}

/// Handle one input line on a blocking worker and render the JSON response
async fn handle_line(context: Arc<RecommenderContext>, line: String) -> String {
    let request: DriverRequest = match serde_json::from_str(&line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed request line");
            return json!({ "error": format!("invalid request: {}", e) }).to_string();
        }
    };

    let result = tokio::task::spawn_blocking(move || match request {
        DriverRequest::Search { search, limit } => {
            let recipes = context.search_by_name(&search, limit);
            Ok(json!({ "recipes": recipes, "total": recipes.len() }))
        }
        DriverRequest::Recommend(request) => context
            .recommend(&request)
            .map(|response| json!(response)),
    })
    .await;

    match result {
        Ok(Ok(value)) => value.to_string(),
        Ok(Err(e)) => json!({ "error": e.to_string() }).to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Request worker failed");
            json!({ "error": "internal error" }).to_string()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = load_configuration()?;

    // Metrics server answers /health/ready with 503 until the context is built
    let readiness = ReadinessState::new();
    observability::init_observability_with_config(&config.observability, readiness.clone())
        .await?;
    info!("{}", config.summary());

    // Corpus loading and embedding are blocking work
    let build_config = config.clone();
    let context =
        tokio::task::spawn_blocking(move || RecommenderContext::from_config(&build_config))
            .await?
            .map_err(|e| anyhow::anyhow!("Failed to build recommender context: {}", e))?;
    let context = Arc::new(context);

    let health = context.health();
    readiness.mark_ready(health.recipes_loaded);
    info!(
        recipes_loaded = health.recipes_loaded,
        embedding_provider = %health.embedding_provider,
        dimensions = health.embedding_dimensions,
        build_ms = health.build_duration_ms,
        "Ready for requests on stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled = 0u64;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(Arc::clone(&context), line).await;
        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        handled += 1;
    }

    let cache = context.query_cache_stats();
    info!(
        requests = handled,
        cache_hits = cache.hits,
        cache_misses = cache.misses,
        "Input closed, shutting down"
    );

    // The remote provider owns a blocking HTTP client, which must not be dropped on the runtime
    tokio::task::spawn_blocking(move || drop(context)).await?;
    Ok(())
}
