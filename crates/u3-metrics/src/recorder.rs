//! In-memory metrics recorder.
//!
//! [`InMemoryRecorder`] keeps one cell per name + label set and can be
//! read back at any time as a [`MetricsSnapshot`]. Install it globally with
//! `metrics::set_global_recorder`, or for one thread with
//! `metrics::with_local_recorder`.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::{Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Default)]
struct Summary {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

#[derive(Debug, Default)]
struct HistogramCell(Mutex<Summary>);

impl HistogramFn for HistogramCell {
    fn record(&self, value: f64) {
        let mut summary = self.0.lock();
        if summary.count == 0 {
            summary.min = value;
            summary.max = value;
        } else {
            summary.min = summary.min.min(value);
            summary.max = summary.max.max(value);
        }
        summary.count += 1;
        summary.sum += value;
    }
}

/// Unit and description registered for one metric name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDescription {
    /// Unit name, if one was given.
    pub unit: Option<String>,
    /// Human-readable description.
    pub description: String,
}

/// Value of one counter for one label set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterSample {
    /// Metric name.
    pub name: String,
    /// Labels, sorted by key.
    pub labels: BTreeMap<String, String>,
    /// Current value.
    pub value: u64,
}

/// Summary of one histogram for one label set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSample {
    /// Metric name.
    pub name: String,
    /// Labels, sorted by key.
    pub labels: BTreeMap<String, String>,
    /// Number of recorded values.
    pub count: u64,
    /// Sum of recorded values.
    pub sum: f64,
    /// Smallest recorded value.
    pub min: f64,
    /// Largest recorded value.
    pub max: f64,
}

fn labels_of(key: &Key) -> BTreeMap<String, String> {
    key.labels()
        .map(|label| (label.key().to_string(), label.value().to_string()))
        .collect()
}

fn matches(labels: &BTreeMap<String, String>, wanted: &[(&str, &str)]) -> bool {
    wanted
        .iter()
        .all(|(k, v)| labels.get(*k).map(String::as_str) == Some(*v))
}

/// Everything recorded up to one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Counters, sorted by name then labels.
    pub counters: Vec<CounterSample>,
    /// Histograms, sorted by name then labels.
    pub histograms: Vec<HistogramSample>,
    /// Registered descriptions by metric name.
    pub descriptions: BTreeMap<String, MetricDescription>,
}

impl MetricsSnapshot {
    /// Sum of counter `name` over every label set.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counter(name, &[])
    }

    /// Sum of counter `name` over label sets containing all of `labels`.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .iter()
            .filter(|s| s.name == name && matches(&s.labels, labels))
            .map(|s| s.value)
            .sum()
    }

    /// Number of values recorded into histogram `name` for label sets
    /// containing all of `labels`.
    pub fn histogram_count(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.histograms
            .iter()
            .filter(|s| s.name == name && matches(&s.labels, labels))
            .map(|s| s.count)
            .sum()
    }

    /// One line per counter and histogram.
    pub fn to_text(&self) -> String {
        let fmt_labels = |labels: &BTreeMap<String, String>| {
            labels
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",")
        };

        let mut out = String::new();
        for s in &self.counters {
            let _ = writeln!(out, "{}{{{}}} {}", s.name, fmt_labels(&s.labels), s.value);
        }
        for s in &self.histograms {
            let mean = if s.count > 0 { s.sum / s.count as f64 } else { 0.0 };
            let _ = writeln!(
                out,
                "{}{{{}}} count={} mean={:.1} min={:.1} max={:.1}",
                s.name,
                fmt_labels(&s.labels),
                s.count,
                mean,
                s.min,
                s.max
            );
        }
        out
    }
}

/// A [`Recorder`] that keeps counters and histogram summaries in memory.
///
/// Gauges are not used by this workspace and are discarded.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    counters: Mutex<HashMap<Key, Arc<AtomicU64>>>,
    histograms: Mutex<HashMap<Key, Arc<HistogramCell>>>,
    descriptions: Mutex<BTreeMap<String, MetricDescription>>,
}

impl InMemoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn describe(&self, key: KeyName, unit: Option<Unit>, description: SharedString) {
        self.descriptions.lock().insert(
            key.as_str().to_string(),
            MetricDescription {
                unit: unit.map(|u| u.as_str().to_string()),
                description: description.to_string(),
            },
        );
    }

    /// Read back everything recorded so far.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut counters: Vec<_> = self
            .counters
            .lock()
            .iter()
            .map(|(key, value)| CounterSample {
                name: key.name().to_string(),
                labels: labels_of(key),
                value: value.load(Ordering::Relaxed),
            })
            .collect();
        counters.sort_by(|a, b| (&a.name, &a.labels).cmp(&(&b.name, &b.labels)));

        let mut histograms: Vec<_> = self
            .histograms
            .lock()
            .iter()
            .map(|(key, cell)| {
                let summary = cell.0.lock();
                HistogramSample {
                    name: key.name().to_string(),
                    labels: labels_of(key),
                    count: summary.count,
                    sum: summary.sum,
                    min: summary.min,
                    max: summary.max,
                }
            })
            .collect();
        histograms.sort_by(|a, b| (&a.name, &a.labels).cmp(&(&b.name, &b.labels)));

        MetricsSnapshot {
            counters,
            histograms,
            descriptions: self.descriptions.lock().clone(),
        }
    }
}

impl Recorder for InMemoryRecorder {
    fn describe_counter(&self, key: KeyName, unit: Option<Unit>, description: SharedString) {
        self.describe(key, unit, description);
    }

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, key: KeyName, unit: Option<Unit>, description: SharedString) {
        self.describe(key, unit, description);
    }

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let cell = Arc::clone(self.counters.lock().entry(key.clone()).or_default());
        Counter::from_arc(cell)
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        let cell = Arc::clone(self.histograms.lock().entry(key.clone()).or_default());
        Histogram::from_arc(cell)
    }
}
