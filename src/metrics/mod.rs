// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::configure;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order store operations (count by outcome, latency)
// - Items written through create/replace
// - Retry attempts and outcomes (store connection at startup)
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Order operation metrics
    pub order_operations: IntCounterVec,
    pub order_operation_duration: HistogramVec,
    pub order_items_written: IntCounter,

    // Retry Metrics
    pub retry_attempts_total: IntCounterVec,
    pub retry_success: IntCounterVec,
    pub retry_failure: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let order_operations = IntCounterVec::new(
            Opts::new("order_operations_total", "Total order store operations"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(order_operations.clone()))?;

        let order_operation_duration = HistogramVec::new(
            HistogramOpts::new("order_operation_duration_seconds", "Order store operation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(order_operation_duration.clone()))?;

        let order_items_written = IntCounter::new(
            "order_items_written_total",
            "Total item rows written by create and replace",
        )?;
        registry.register(Box::new(order_items_written.clone()))?;

        // Retry Metrics
        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Total retry attempts"),
            &["operation", "attempt"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let retry_success = IntCounterVec::new(
            Opts::new("retry_success_total", "Total successful retries"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_success.clone()))?;

        let retry_failure = IntCounterVec::new(
            Opts::new("retry_failure_total", "Total failed retries after all attempts"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_failure.clone()))?;

        Ok(Self {
            registry,
            order_operations,
            order_operation_duration,
            order_items_written,
            retry_attempts_total,
            retry_success,
            retry_failure,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record one order store operation.
    /// `outcome` is "ok" or an `OrderError::kind()` label.
    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.order_operations.with_label_values(&[operation, outcome]).inc();
        self.order_operation_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    pub fn record_items_written(&self, count: usize) {
        self.order_items_written.inc_by(count as u64);
    }

    /// Helper to record retry attempt
    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        self.retry_attempts_total.with_label_values(&[operation, &attempt.to_string()]).inc();
    }

    /// Helper to record retry outcome
    pub fn record_retry_outcome(&self, operation: &str, success: bool) {
        if success {
            self.retry_success.with_label_values(&[operation]).inc();
        } else {
            self.retry_failure.with_label_values(&[operation]).inc();
        }
    }
}
