//! Logging, tracing and metrics settings.
//!
//! # Environment Variables
//!
//! - `OBSERVABILITY_ENABLED`: file/JSON logs, OTLP export and metrics (default: true)
//! - `LOG_LEVEL`: level for the application's own targets (default: "info")
//! - `LOG_DIR`: directory for rolling log files (default: "storage/logs")
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP collector; tracing export is off when unset
//! - `METRICS_PORT`: port of the Prometheus scrape endpoint (default: 9090)

use std::env;

#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    pub log_level: String,
    pub log_dir: String,
    pub otlp_endpoint: Option<String>,
    pub metrics_port: u16,
    pub environment: String,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: crate::parse_bool(env::var("OBSERVABILITY_ENABLED").ok().as_deref(), true),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string()),
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.trim().is_empty()),
            metrics_port: env::var("METRICS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(9090),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: "info".to_string(),
            log_dir: "storage/logs".to_string(),
            otlp_endpoint: None,
            metrics_port: 9090,
            environment: "development".to_string(),
        }
    }
}
