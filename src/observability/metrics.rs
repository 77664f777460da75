//! # Metrics
//!
//! Prometheus metrics for provisioning runs.
//!
//! The provisioner is a one-shot command, so there is no scrape endpoint.
//! Metrics are written as a node-exporter textfile when a metrics file is
//! configured.
//!
//! ## Metrics Exposed
//!
//! - `swarm_secrets_entries_total{outcome}` - Manifest entries processed, by outcome
//! - `swarm_secrets_store_operations_total{operation}` - Secret store calls
//! - `swarm_secrets_store_operation_errors_total{operation}` - Failed secret store calls
//! - `swarm_secrets_store_operation_duration_seconds{operation}` - Duration of store calls
//! - `swarm_secrets_run_duration_seconds` - Duration of provisioning runs
//! - `swarm_secrets_last_run_timestamp_seconds` - Unix time the last run finished

use anyhow::{Context, Result};
use prometheus::{Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge, Registry, TextEncoder};
use std::path::Path;
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static ENTRIES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "swarm_secrets_entries_total",
            "Total number of manifest entries processed by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create ENTRIES_TOTAL metric - this should never happen")
});

static STORE_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "swarm_secrets_store_operations_total",
            "Total number of secret store operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATIONS_TOTAL metric - this should never happen")
});

static STORE_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "swarm_secrets_store_operation_errors_total",
            "Total number of failed secret store operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static STORE_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "swarm_secrets_store_operation_duration_seconds",
            "Duration of secret store operations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATION_DURATION metric - this should never happen")
});

static RUN_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "swarm_secrets_run_duration_seconds",
            "Duration of provisioning runs in seconds",
        )
        .buckets(vec![0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("Failed to create RUN_DURATION metric - this should never happen")
});

static LAST_RUN_TIMESTAMP: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "swarm_secrets_last_run_timestamp_seconds",
        "Unix timestamp of the last completed provisioning run",
    )
    .expect("Failed to create LAST_RUN_TIMESTAMP metric - this should never happen")
});

static REGISTERED: LazyLock<Result<(), String>> = LazyLock::new(|| {
    let register = || -> prometheus::Result<()> {
        REGISTRY.register(Box::new(ENTRIES_TOTAL.clone()))?;
        REGISTRY.register(Box::new(STORE_OPERATIONS_TOTAL.clone()))?;
        REGISTRY.register(Box::new(STORE_OPERATION_ERRORS_TOTAL.clone()))?;
        REGISTRY.register(Box::new(STORE_OPERATION_DURATION.clone()))?;
        REGISTRY.register(Box::new(RUN_DURATION.clone()))?;
        REGISTRY.register(Box::new(LAST_RUN_TIMESTAMP.clone()))?;
        Ok(())
    };
    register().map_err(|e| e.to_string())
});

/// Register all metrics with the registry; safe to call more than once
///
/// # Errors
///
/// Returns an error if a metric could not be registered.
pub fn register_metrics() -> Result<()> {
    REGISTERED
        .clone()
        .map_err(|e| anyhow::anyhow!("Failed to register metrics: {e}"))
}

pub fn increment_entries(outcome: &str) {
    ENTRIES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn observe_store_operation(operation: &str, duration: f64) {
    STORE_OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
    STORE_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_store_operation_errors(operation: &str) {
    STORE_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn observe_run_duration(duration: f64) {
    RUN_DURATION.observe(duration);
}

pub fn set_last_run_timestamp(timestamp: i64) {
    LAST_RUN_TIMESTAMP.set(timestamp);
}

/// Render the registry in the Prometheus text format
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Encoded metrics are not valid UTF-8")
}

/// Write metrics to a node-exporter textfile
///
/// Writes to a sibling `.tmp` file and renames it into place so the
/// collector never reads a half-written file.
///
/// # Errors
///
/// Returns an error if rendering, writing or renaming fails.
pub fn write_textfile(path: &Path) -> Result<()> {
    let rendered = render()?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, rendered)
        .with_context(|| format!("Failed to write metrics to {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move metrics file into {}", path.display()))?;
    Ok(())
}
