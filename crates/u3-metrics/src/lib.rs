//! Metrics infrastructure for U3 device transactions.
//!
//! This crate declares every metric the workspace records as a structured
//! [`Metric`] constant, provides label helpers and an [`InMemoryRecorder`]
//! that collects what was recorded into a [`MetricsSnapshot`]. It re-exports
//! the `metrics` crate so recorders and call sites agree on one version.
//!
//! # Example
//!
//! ```rust,ignore
//! use u3_metrics::{MetricLabels, metric_defs, describe_metrics};
//!
//! // Register descriptions once, after installing a recorder.
//! describe_metrics();
//!
//! let labels = MetricLabels::new("sim", "config-u3");
//! metrics::counter!(metric_defs::TRANSACTION_STARTED.name, &labels.to_labels()).increment(1);
//! ```

mod recorder;

pub use metrics;
pub use recorder::{CounterSample, HistogramSample, InMemoryRecorder, MetricDescription, MetricsSnapshot};

use metrics::{describe_counter, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// # Example
///
/// ```rust
/// use u3_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const READS: Metric = Metric::counter("u3.transport.reads")
///     .with_description("Reads issued to the transport")
///     .with_unit(Unit::Count)
///     .with_labels(&["device"]);
///
/// assert_eq!(READS.name, "u3.transport.reads");
/// assert_eq!(READS.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "u3.transaction.started").
    pub name: &'static str,
    /// The kind of metric (counter or histogram).
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    ///
    /// This should be called once at startup for each metric.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the workspace.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on every transaction metric.
    pub const STANDARD_LABELS: &[&str] = &["device", "command"];

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Transactions started.
    pub const TRANSACTION_STARTED: Metric = Metric::counter("u3.transaction.started")
        .with_description("Transactions started")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Transactions that decoded a response.
    pub const TRANSACTION_SUCCEEDED: Metric = Metric::counter("u3.transaction.succeeded")
        .with_description("Transactions that validated and decoded a response")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Transactions that ended in an error.
    ///
    /// Labels: device, command, error
    pub const TRANSACTION_FAILED: Metric = Metric::counter("u3.transaction.failed")
        .with_description("Transactions that ended in an error")
        .with_unit(Unit::Count)
        .with_labels(&["device", "command", "error"]);

    /// Wall-clock time from open to close.
    pub const TRANSACTION_LATENCY: Metric = Metric::histogram("u3.transaction.latency_us")
        .with_description("Wall-clock time of one transaction in microseconds")
        .with_unit(Unit::Microseconds)
        .with_labels(STANDARD_LABELS);

    // ========================================================================
    // Transport
    // ========================================================================

    /// Bytes written to the device.
    pub const TRANSPORT_TX_BYTES: Metric = Metric::counter("u3.transport.tx_bytes")
        .with_description("Bytes written to the device")
        .with_unit(Unit::Bytes)
        .with_labels(STANDARD_LABELS);

    /// Bytes read from the device.
    pub const TRANSPORT_RX_BYTES: Metric = Metric::counter("u3.transport.rx_bytes")
        .with_description("Bytes read from the device")
        .with_unit(Unit::Bytes)
        .with_labels(STANDARD_LABELS);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        &TRANSACTION_STARTED,
        &TRANSACTION_SUCCEEDED,
        &TRANSACTION_FAILED,
        &TRANSACTION_LATENCY,
        &TRANSPORT_TX_BYTES,
        &TRANSPORT_RX_BYTES,
    ];
}

/// Labels identifying the device and command of a transaction.
///
/// # Example
///
/// ```rust
/// use u3_metrics::MetricLabels;
///
/// let labels = MetricLabels::new("sim", "ain");
/// let extended = labels.with(&[("error", "device_error".to_string())]);
/// assert_eq!(extended.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MetricLabels {
    /// Device the transaction ran against (transport name).
    pub device: String,
    /// Command name.
    pub command: String,
}

impl MetricLabels {
    /// Creates labels for one device and command.
    pub fn new(device: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            command: command.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("device", self.device.clone()), ("command", self.command.clone())]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes all metrics used in the workspace.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_labels() {
        let labels = MetricLabels::new("tcp:127.0.0.1:5000", "config-io");
        let label_vec = labels.to_labels();

        assert_eq!(label_vec.len(), 2);
        assert!(label_vec.contains(&("device", "tcp:127.0.0.1:5000".to_string())));
        assert!(label_vec.contains(&("command", "config-io".to_string())));
    }

    #[test]
    fn test_with_extra_labels() {
        let labels = MetricLabels::new("sim", "ain");
        let extended = labels.with(&[("error", "timeout".to_string())]);

        assert_eq!(extended.len(), 3);
        assert!(extended.contains(&("error", "timeout".to_string())));
    }

    #[test]
    fn test_metric_definitions() {
        assert_eq!(metric_defs::TRANSACTION_STARTED.name, "u3.transaction.started");
        assert_eq!(metric_defs::TRANSACTION_STARTED.kind, MetricKind::Counter);
        assert_eq!(metric_defs::TRANSACTION_LATENCY.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::TRANSACTION_LATENCY.unit, Some(Unit::Microseconds));
        assert_eq!(metric_defs::TRANSACTION_FAILED.labels, &["device", "command", "error"]);
    }

    #[test]
    fn test_all_metrics_have_descriptions() {
        assert_eq!(metric_defs::ALL.len(), 6);
        for metric in metric_defs::ALL {
            assert!(!metric.description.is_empty(), "{}", metric.name);
        }
    }

    #[test]
    fn test_metric_minimal() {
        const MINIMAL: Metric = Metric::histogram("minimal");

        assert_eq!(MINIMAL.name, "minimal");
        assert_eq!(MINIMAL.kind, MetricKind::Histogram);
        assert_eq!(MINIMAL.kind.to_string(), "histogram");
        assert_eq!(MINIMAL.description, "");
        assert_eq!(MINIMAL.unit, None);
        assert_eq!(MINIMAL.labels, &[] as &[&str]);
    }
}
