//! Prometheus request metrics.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `oasis_requests_total` | Counter | `operation`, `status` | Completed requests |
//! | `oasis_request_duration_seconds` | Histogram | `operation` | Request latency |
//! | `oasis_validation_failures_total` | Counter | `type` | Rejected requests and response schema mismatches |
//!
//! Recording before [`init_metrics`] is a no-op.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "oasis_requests_total";

/// Request latency histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "oasis_request_duration_seconds";

/// Validation failure counter name.
pub const VALIDATION_FAILURES_TOTAL: &str = "oasis_validation_failures_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// Calling this more than once is an error from the `metrics` crate.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the recorder cannot be installed,
/// or `TelemetryError::InvalidConfig` for an empty bucket list.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of endpoint requests completed");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Endpoint request duration in seconds"
    );
    describe_counter!(
        VALIDATION_FAILURES_TOTAL,
        "Total validation failures by type"
    );
}

/// Records a completed request.
pub fn record_request(operation: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a validation failure of the given kind (e.g. `"parameter"`, `"request"`, `"response"`).
pub fn record_validation_failure(kind: &str) {
    counter!(VALIDATION_FAILURES_TOTAL, "type" => kind.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_request("search", 200, Duration::from_millis(10));
        record_validation_failure("request");
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_empty_buckets_rejected() {
        let config = MetricsConfig {
            enabled: true,
            duration_buckets: Vec::new(),
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }
}
