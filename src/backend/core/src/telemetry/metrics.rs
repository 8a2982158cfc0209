//! Prometheus metrics.
//!
//! Counters are recorded through the `metrics` facade wherever the event
//! happens; this module installs the recorder and names the series:
//!
//! - `cephas_http_requests_total` / `cephas_http_request_duration_seconds`
//! - `cephas_store_operations_total{operation,outcome}`
//! - `cephas_errors_total{code,category,severity}`

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Histogram buckets for request durations (in seconds)
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,

    /// Global labels to add to all metrics
    #[serde(default)]
    pub global_labels: BTreeMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            duration_buckets: default_duration_buckets(),
            global_labels: BTreeMap::new(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_duration_buckets() -> Vec<f64> {
    vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
}

/// Handle to the installed recorder, if any.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    prometheus_handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("prometheus_handle", &self.prometheus_handle.is_some())
            .finish()
    }
}

impl MetricsRegistry {
    /// Registry with no recorder; nothing is exported.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self {
            prometheus_handle: Some(handle),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.prometheus_handle.is_some()
    }

    /// Render all metrics in Prometheus text format, `None` when disabled.
    pub fn render(&self) -> Option<String> {
        self.prometheus_handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Install the global Prometheus recorder.
///
/// # Errors
///
/// Returns an error if the buckets are empty or a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig, service_name: &str) -> anyhow::Result<MetricsRegistry> {
    if !config.enabled {
        tracing::info!("Metrics disabled");
        return Ok(MetricsRegistry::disabled());
    }

    let mut builder = PrometheusBuilder::new().add_global_label("service", service_name);
    for (key, value) in &config.global_labels {
        builder = builder.add_global_label(key, value);
    }
    builder = builder.set_buckets(&config.duration_buckets)?;

    let handle = builder.install_recorder()?;
    register_metric_descriptions();

    tracing::info!(service_name = %service_name, "Metrics initialized");
    Ok(MetricsRegistry::from_handle(handle))
}

fn register_metric_descriptions() {
    describe_counter!("cephas_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "cephas_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "cephas_store_operations_total",
        "Event store operations by outcome"
    );
    describe_counter!("cephas_errors_total", "Application errors by code");
}

/// Request duration and count for one HTTP exchange.
pub struct RequestDurationHistogram;

impl RequestDurationHistogram {
    pub fn record(method: &str, route: &str, status_code: u16, duration_seconds: f64) {
        let labels = [
            ("method", method.to_string()),
            ("route", route.to_string()),
            ("status", status_code.to_string()),
        ];

        histogram!("cephas_http_request_duration_seconds", &labels).record(duration_seconds);
        counter!("cephas_http_requests_total", &labels).increment(1);
    }
}
