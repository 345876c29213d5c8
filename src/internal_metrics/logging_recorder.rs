//! A metrics recorder that periodically logs all captured metrics.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A metrics recorder that periodically logs all captured metrics with `tracing::info!`.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    /// Creates a new `LoggingRecorder` and starts a background task to log metrics.
    ///
    /// The task logs a snapshot every `interval` and one last snapshot when
    /// `shutdown_rx` changes or its sender is dropped.
    pub fn new(interval: Duration, shutdown_rx: watch::Receiver<()>) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        let recorder = Self {
            registry: registry.clone(),
        };

        let mut shutdown_rx = shutdown_rx;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => log_snapshot(&registry),
                    _ = shutdown_rx.changed() => {
                        log_snapshot(&registry);
                        break;
                    }
                }
            }
        });

        (recorder, handle)
    }
}

fn log_snapshot(registry: &Registry<Key, AtomicStorage>) {
    tracing::info!("--- Metrics Snapshot ---");
    for line in snapshot(registry) {
        tracing::info!("{}", line);
    }
}

/// Renders every registered metric as one line, sorted for stable output.
fn snapshot(registry: &Registry<Key, AtomicStorage>) -> Vec<String> {
    let mut lines = Vec::new();

    for (key, counter) in registry.get_counter_handles() {
        let value = counter.load(Ordering::Relaxed);
        lines.push(format!("[Counter] {}: {}", display_key(&key), value));
    }

    for (key, gauge) in registry.get_gauge_handles() {
        let value = f64::from_bits(gauge.load(Ordering::Relaxed));
        lines.push(format!("[Gauge] {}: {}", display_key(&key), value));
    }

    for (key, histogram) in registry.get_histogram_handles() {
        let samples = histogram.data();
        if samples.is_empty() {
            continue;
        }
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        lines.push(format!(
            "[Histogram] {}: count={} mean={:.3}",
            display_key(&key),
            samples.len(),
            mean
        ));
    }

    lines.sort();
    lines
}

fn display_key(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
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
