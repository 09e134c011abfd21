//! # Observability Configuration
//!
//! Environment-specific settings for logging, tracing export and metrics.

use std::env;

/// Service name attached to logs and metrics
pub const SERVICE_NAME: &str = "pantry-match";

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// OTLP endpoint for trace export
    pub otlp_endpoint: Option<String>,
    /// Prometheus metrics endpoint port
    pub metrics_port: u16,
    /// Log level for the crate
    pub log_level: String,
    /// Whether to enable trace sampling
    pub enable_trace_sampling: bool,
    /// Trace sampling ratio (0.0-1.0)
    pub trace_sampling_ratio: f64,
    /// Whether to serve Prometheus metrics
    pub enable_metrics_export: bool,
    /// Additional tags for metrics and traces
    pub tags: Vec<(String, String)>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            otlp_endpoint: None,
            metrics_port: 9090,
            log_level: "info".to_string(),
            enable_trace_sampling: false,
            trace_sampling_ratio: 1.0,
            enable_metrics_export: true,
            tags: Vec::new(),
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    ///
    /// `ENVIRONMENT` selects a preset; the other variables override it field
    /// by field when set and parseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let mut config = presets::for_environment(&environment);

        if let Some(endpoint) = lookup("OTLP_ENDPOINT") {
            config.otlp_endpoint = Some(endpoint);
        }
        if let Some(port) = lookup("METRICS_PORT").and_then(|v| v.parse().ok()) {
            config.metrics_port = port;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(enabled) = lookup("ENABLE_TRACE_SAMPLING").and_then(|v| v.parse().ok()) {
            config.enable_trace_sampling = enabled;
        }
        if let Some(ratio) = lookup("TRACE_SAMPLING_RATIO").and_then(|v| v.parse().ok()) {
            config.trace_sampling_ratio = ratio;
        }
        if let Some(enabled) = lookup("ENABLE_METRICS_EXPORT").and_then(|v| v.parse().ok()) {
            config.enable_metrics_export = enabled;
        }
        if let Some(raw) = lookup("OBSERVABILITY_TAGS") {
            config.tags = parse_tags(&raw);
        }

        config.add_default_tags(lookup("SERVICE_VERSION"));
        config
    }

    /// Add environment and service tags
    fn add_default_tags(&mut self, version: Option<String>) {
        self.tags
            .push(("environment".to_string(), self.environment.clone()));
        self.tags
            .push(("service".to_string(), SERVICE_NAME.to_string()));
        if let Some(version) = version {
            self.tags.push(("version".to_string(), version));
        }
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid OTLP endpoint format: {}", endpoint));
            }
        }

        if !(0.0..=1.0).contains(&self.trace_sampling_ratio) {
            return Err(format!(
                "Invalid trace sampling ratio: {}",
                self.trace_sampling_ratio
            ));
        }

        if self.metrics_port == 0 {
            return Err(format!("Invalid metrics port: {}", self.metrics_port));
        }

        Ok(())
    }
}

/// Parse tags from environment variable string
/// Format: "key1=value1,key2=value2"
fn parse_tags(tags_str: &str) -> Vec<(String, String)> {
    tags_str
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => {
                    Some((key.trim().to_string(), value.trim().to_string()))
                }
                _ => None,
            }
        })
        .collect()
}

/// Environment-specific configuration presets
pub mod presets {
    use super::ObservabilityConfig;

    /// Preset for a named environment; unknown names get the defaults
    pub fn for_environment(environment: &str) -> ObservabilityConfig {
        match environment {
            "production" => production(),
            "development" => development(),
            other => ObservabilityConfig {
                environment: other.to_string(),
                ..Default::default()
            },
        }
    }

    /// Development configuration with verbose logging
    pub fn development() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Production configuration with sampled traces
    pub fn production() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "production".to_string(),
            enable_trace_sampling: true,
            trace_sampling_ratio: 0.1,
            log_level: "warn".to_string(),
            ..Default::default()
        }
    }
}
