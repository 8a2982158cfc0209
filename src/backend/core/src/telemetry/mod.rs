//! Telemetry: structured logging and Prometheus metrics.
//!
//! # Example
//!
//! ```rust,no_run
//! use cephas_core::config::Config;
//! use cephas_core::telemetry::init_telemetry;
//!
//! let config = Config::default();
//! let telemetry = init_telemetry(&config.logging, &config.metrics).unwrap();
//! assert!(telemetry.metrics.is_enabled());
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{build_filter, init_logging, LogFormat, LoggingConfig, SpanEventConfig};
pub use metrics::{init_metrics, MetricsConfig, MetricsRegistry, RequestDurationHistogram};

/// Name reported in logs and as the `service` metrics label.
pub const SERVICE_NAME: &str = "cephas";

/// Install logging first, then metrics, so metrics setup is logged.
///
/// # Errors
///
/// Returns an error if either component fails to initialize.
pub fn init_telemetry(
    logging: &LoggingConfig,
    metrics: &MetricsConfig,
) -> anyhow::Result<TelemetryHandle> {
    init_logging(logging)?;
    let metrics = init_metrics(metrics, SERVICE_NAME)?;

    Ok(TelemetryHandle { metrics })
}

/// Handle for the installed telemetry components.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    pub metrics: MetricsRegistry,
}
