//! Metric descriptions and a recorder that writes metrics to the log.
//!
//! No exporter is bundled. When `core.log_metrics` is set the binary installs
//! `LoggingRecorder` and logs a snapshot of every counter and gauge before it
//! exits.

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Label, Metadata, Recorder, SharedString, Unit,
};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

/// Registers descriptions for every metric the crate emits.
pub fn describe_metrics() {
    metrics::describe_counter!("analysis_requests_total", Unit::Count, "Analysis requests, labeled by cache outcome (hit, miss, invalid).");
    metrics::describe_counter!("check_outcomes_total", Unit::Count, "Settled checks, labeled by check name and status (ok, failed, timeout).");
    metrics::describe_histogram!("analysis_duration_seconds", Unit::Seconds, "Time taken by an analysis that missed the cache.");
    metrics::describe_counter!("reports_submitted_total", Unit::Count, "Reported URLs, labeled by final status.");
    metrics::describe_gauge!("result_cache_entries", Unit::Count, "Number of reports currently held by the result cache.");
}

/// A recorder that keeps every metric in an in-memory registry.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

/// Read access to the values captured by a `LoggingRecorder`.
#[derive(Clone)]
pub struct MetricsSnapshot {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    pub fn new() -> (Self, MetricsSnapshot) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        (
            Self {
                registry: registry.clone(),
            },
            MetricsSnapshot { registry },
        )
    }
}

fn key_for(name: &str, labels: &[(&str, &str)]) -> Key {
    let labels: Vec<Label> = labels
        .iter()
        .map(|(k, v)| Label::new(k.to_string(), v.to_string()))
        .collect();
    Key::from_parts(name.to_string(), labels)
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        self.registry
            .get_counter_handles()
            .get(&key_for(name, labels))
            .map(|c| c.load(Ordering::Relaxed))
    }

    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.registry
            .get_gauge_handles()
            .get(&key_for(name, labels))
            .map(|g| f64::from_bits(g.load(Ordering::Relaxed)))
    }

    /// Logs every counter and gauge at INFO level.
    pub fn log(&self) {
        info!("--- Metrics Snapshot ---");
        for (key, counter) in self.registry.get_counter_handles() {
            info!("[Counter] {}: {}", key, counter.load(Ordering::Relaxed));
        }
        for (key, gauge) in self.registry.get_gauge_handles() {
            info!("[Gauge] {}: {}", key, f64::from_bits(gauge.load(Ordering::Relaxed)));
        }
        // Histograms are recorded but not summarised.
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}
