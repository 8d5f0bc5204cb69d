//! Store metrics for observability

use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<StoreMetricsInner> = OnceLock::new();

struct StoreMetricsInner {
    operations: CounterVec,
    errors: CounterVec,
}

impl StoreMetricsInner {
    fn new() -> Self {
        Self {
            operations: CounterVec::new(
                Opts::new("set_store_operations_total", "Total store operations"),
                &["backend", "op"],
            )
            .expect("valid metric definition"),
            errors: CounterVec::new(
                Opts::new("set_store_errors_total", "Total failed store operations"),
                &["backend", "op"],
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.operations.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static StoreMetricsInner {
    METRICS.get_or_init(StoreMetricsInner::new)
}

/// Store metrics wrapper, labelled by backend name
#[derive(Clone, Copy)]
pub struct StoreMetrics {
    backend: &'static str,
}

impl StoreMetrics {
    pub fn new(backend: &'static str) -> Self {
        Self { backend }
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_op(&self, op: &str) {
        get_metrics()
            .operations
            .with_label_values(&[self.backend, op])
            .inc();
    }

    pub fn record_error(&self, op: &str) {
        get_metrics()
            .errors
            .with_label_values(&[self.backend, op])
            .inc();
    }

    #[cfg(test)]
    pub(crate) fn op_count(&self, op: &str) -> f64 {
        get_metrics()
            .operations
            .with_label_values(&[self.backend, op])
            .get()
    }
}
