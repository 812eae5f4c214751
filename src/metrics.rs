//! Prometheus metrics registry and instruments.
//!
//! Instruments are updated from the store and backup layers whether or not
//! the registry has been initialised; `init_metrics` only makes them
//! gatherable.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::time::Duration;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("kinetic_quotes_db_queries_total", "Total number of database queries"),
        &["operation", "status"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "kinetic_quotes_db_query_duration_seconds",
            "Database query duration in seconds"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation"]
    ).expect("metric can be created");

    // Collection Metrics
    pub static ref QUOTES_CREATED_TOTAL: IntCounter = IntCounter::new(
        "kinetic_quotes_created_total",
        "Total number of quotes created one at a time"
    ).expect("metric can be created");
    pub static ref QUOTES_IMPORTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("kinetic_quotes_import_records_total", "Import records by outcome"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref QUOTES_DELETED_TOTAL: IntCounter = IntCounter::new(
        "kinetic_quotes_deleted_total",
        "Total number of quotes deleted"
    ).expect("metric can be created");
    pub static ref QUOTES_STORED: IntGauge = IntGauge::new(
        "kinetic_quotes_stored",
        "Current number of stored quotes"
    ).expect("metric can be created");
    pub static ref SNAPSHOT_SUBSCRIBERS: IntGauge = IntGauge::new(
        "kinetic_quotes_snapshot_subscribers",
        "Current number of snapshot subscribers"
    ).expect("metric can be created");

    // Backup Metrics
    pub static ref BACKUPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("kinetic_quotes_backups_total", "Total number of backups attempted"),
        &["status"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("kinetic_quotes_errors_total", "Total number of errors"),
        &["error_type", "operation"]
    ).expect("metric can be created");
}

/// Record one database operation.
pub fn observe_db_query(operation: &str, status: &str, elapsed: Duration) {
    DB_QUERIES_TOTAL
        .with_label_values(&[operation, status])
        .inc();
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(DB_QUERIES_TOTAL.clone()))
        .expect("DB_QUERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("DB_QUERY_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(QUOTES_CREATED_TOTAL.clone()))
        .expect("QUOTES_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(QUOTES_IMPORTED_TOTAL.clone()))
        .expect("QUOTES_IMPORTED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(QUOTES_DELETED_TOTAL.clone()))
        .expect("QUOTES_DELETED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(QUOTES_STORED.clone()))
        .expect("QUOTES_STORED can be registered");
    REGISTRY
        .register(Box::new(SNAPSHOT_SUBSCRIBERS.clone()))
        .expect("SNAPSHOT_SUBSCRIBERS can be registered");
    REGISTRY
        .register(Box::new(BACKUPS_TOTAL.clone()))
        .expect("BACKUPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Render the registry in the Prometheus text format.
pub fn render() -> String {
    use prometheus::TextEncoder;

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_text) => metrics_text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            String::new()
        }
    }
}
