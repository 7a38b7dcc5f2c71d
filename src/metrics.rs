// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the vanity domain manager.
//!
//! All metrics use the namespace prefix `vanity_domain_manager`.
//!
//! # Metrics Categories
//!
//! - **Job Metrics** - Jobs processed by kind and outcome, and how long they took
//! - **Delivery Metrics** - What the delivery controller decided for each delivery
//! - **Environment Metrics** - Secret and ingress operations against the cluster
//! - **Status Metrics** - Status updates that could not be published
//!
//! # Example
//!
//! ```rust,no_run
//! use vanity_domain_manager::metrics::record_job_success;
//!
//! record_job_success("add", std::time::Duration::from_millis(420));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "vanity_domain_manager";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Job Metrics
// ============================================================================

/// Total number of processed jobs by kind and outcome
///
/// Labels:
/// - `kind`: Job kind (`add`, `change`, `remove`)
/// - `outcome`: `success` or the failing [`crate::errors::JobError::category`]
pub static JOBS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_jobs_total"),
        "Total number of processed jobs by kind and outcome",
    );
    let counter = CounterVec::new(opts, &["kind", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of job processing in seconds
///
/// Labels:
/// - `kind`: Job kind
pub static JOB_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_job_duration_seconds"),
        "Duration of job processing in seconds by kind",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Delivery Metrics
// ============================================================================

/// Total number of delivery decisions
///
/// Labels:
/// - `decision`: `ack`, `retry`, `drop` or `unparsable`
pub static DELIVERY_DECISIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_delivery_decisions_total"),
        "Total number of delivery decisions by decision",
    );
    let counter = CounterVec::new(opts, &["decision"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of failed acknowledgments
///
/// Labels:
/// - `operation`: `ack` or `nak`
pub static DELIVERY_ACK_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_delivery_ack_failures_total"),
        "Total number of acknowledgments that could not be sent",
    );
    let counter = CounterVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Environment Metrics
// ============================================================================

/// Total number of environment resource operations
///
/// Labels:
/// - `resource_type`: `Secret` or `Ingress`
/// - `operation`: `create`, `update` or `delete`
/// - `status`: `success` or `error`
pub static RESOURCE_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resource_operations_total"),
        "Total number of environment resource operations by type, operation and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Status Metrics
// ============================================================================

/// Total number of status updates that could not be published
///
/// Labels:
/// - `kind`: `success`, `failure` or `dropped`
pub static STATUS_PUBLISH_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_status_publish_failures_total"),
        "Total number of status updates that could not be published",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record a successfully processed job
///
/// # Arguments
/// * `kind` - The job kind (e.g., `add`)
/// * `duration` - Duration of processing
pub fn record_job_success(kind: &str, duration: Duration) {
    JOBS_TOTAL.with_label_values(&[kind, "success"]).inc();
    JOB_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(duration.as_secs_f64());
}

/// Record a failed job
///
/// # Arguments
/// * `kind` - The job kind
/// * `category` - Error category (e.g., `verification`)
/// * `duration` - Duration of processing before failure
pub fn record_job_failure(kind: &str, category: &str, duration: Duration) {
    JOBS_TOTAL.with_label_values(&[kind, category]).inc();
    JOB_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(duration.as_secs_f64());
}

/// Record a delivery decision (`ack`, `retry`, `drop`, `unparsable`)
pub fn record_delivery_decision(decision: &str) {
    DELIVERY_DECISIONS_TOTAL
        .with_label_values(&[decision])
        .inc();
}

/// Record an acknowledgment that could not be sent
pub fn record_ack_failure(operation: &str) {
    DELIVERY_ACK_FAILURES_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Record an environment resource operation
///
/// # Arguments
/// * `resource_type` - `Secret` or `Ingress`
/// * `operation` - `create`, `update` or `delete`
/// * `success` - Whether the operation succeeded
pub fn record_resource_operation(resource_type: &str, operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    RESOURCE_OPERATIONS_TOTAL
        .with_label_values(&[resource_type, operation, status])
        .inc();
}

/// Record a status update that could not be published
pub fn record_status_publish_failure(kind: &str) {
    STATUS_PUBLISH_FAILURES_TOTAL
        .with_label_values(&[kind])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
