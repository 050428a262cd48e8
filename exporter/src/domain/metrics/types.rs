//! Data model shared by extraction, grouping and EMF rendering

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::grouper::{FIELD_LABELS, FIELD_NAME};
use super::key::GroupedMetricKey;
use crate::core::config::DimensionRollupOption;

/// Flat label set of one data point
pub type Labels = HashMap<String, String>;

/// Key -> bucket mapping owned by a single export cycle
pub type GroupedMetrics = HashMap<GroupedMetricKey, GroupedMetricBucket>;

// ============================================================================
// METRIC TYPE
// ============================================================================

/// OTLP metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    #[default]
    Gauge,
    Sum,
    Histogram,
    ExponentialHistogram,
    Summary,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Sum => "sum",
            Self::Histogram => "histogram",
            Self::ExponentialHistogram => "exponential_histogram",
            Self::Summary => "summary",
        }
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// CloudWatch statistic set (histograms and summaries)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatisticSet {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

/// Value of one data point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Double(f64),
    Stats(StatisticSet),
}

// ============================================================================
// DATA POINTS
// ============================================================================

/// One observation of a metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDataPoint {
    pub value: MetricValue,
    /// Milliseconds since Unix epoch, 0 when unset
    pub timestamp_ms: i64,
    pub labels: Labels,
    /// False when extraction decided the point must not be emitted
    pub retained: bool,
}

/// A metric with its data points, as produced by extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetric {
    pub name: String,
    /// Raw OTLP unit, possibly empty
    pub unit: String,
    pub metric_type: MetricType,
    pub data_points: Vec<MetricDataPoint>,
}

// ============================================================================
// GROUPING
// ============================================================================

/// Non-label part of a grouping key.
///
/// Two data points share a bucket only when every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupIdentity {
    pub namespace: String,
    /// Running timestamp in milliseconds
    pub timestamp_ms: i64,
    pub log_group: String,
    pub log_stream: String,
    pub metric_type: MetricType,
    pub dimension_rollup: DimensionRollupOption,
}

/// Value plus resolved unit
#[derive(Debug, Clone, PartialEq)]
pub struct MetricInfo {
    pub value: MetricValue,
    pub unit: String,
}

/// Metrics sharing one grouping key within an export cycle
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMetricBucket {
    /// Label snapshot taken when the bucket was created
    pub labels: Labels,
    /// Metric name -> info, first writer wins
    pub metrics: BTreeMap<String, MetricInfo>,
    pub metadata: GroupIdentity,
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

/// Per-metric unit override from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub metric_name: String,
    pub unit: String,
    /// Replace the unit even when the data point carries one
    #[serde(default)]
    pub overwrite: bool,
}

/// Lookup of descriptor overrides by metric name
pub trait DescriptorLookup {
    fn lookup(&self, metric_name: &str) -> Option<&MetricDescriptor>;
}

impl DescriptorLookup for HashMap<String, MetricDescriptor> {
    fn lookup(&self, metric_name: &str) -> Option<&MetricDescriptor> {
        self.get(metric_name)
    }
}

// ============================================================================
// WARNINGS
// ============================================================================

/// Receives recoverable grouping warnings.
///
/// Shared across independent export cycles, hence `Send + Sync`.
pub trait WarnSink: Send + Sync {
    fn warn(&self, message: &str, fields: &[(&str, String)]);
}

/// Forwards warnings to `tracing`.
///
/// `Name` and `Labels` become the `name` and `labels` event fields; any other
/// fields are carried in `extra`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarnSink;

impl WarnSink for TracingWarnSink {
    fn warn(&self, message: &str, fields: &[(&str, String)]) {
        let field = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        let extra: BTreeMap<&str, &str> = fields
            .iter()
            .filter(|(k, _)| *k != FIELD_NAME && *k != FIELD_LABELS)
            .map(|(k, v)| (*k, v.as_str()))
            .collect();

        match (field(FIELD_NAME), field(FIELD_LABELS)) {
            (Some(name), Some(labels)) if extra.is_empty() => {
                tracing::warn!(name, labels, "{}", message)
            }
            (name, labels) => tracing::warn!(?name, ?labels, ?extra, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_type_as_str() {
        assert_eq!(MetricType::Gauge.as_str(), "gauge");
        assert_eq!(MetricType::Sum.as_str(), "sum");
        assert_eq!(MetricType::Histogram.as_str(), "histogram");
        assert_eq!(
            MetricType::ExponentialHistogram.as_str(),
            "exponential_histogram"
        );
        assert_eq!(MetricType::Summary.as_str(), "summary");
    }

    #[test]
    fn test_metric_value_serialization() {
        assert_eq!(serde_json::to_value(MetricValue::Int(3)).unwrap(), 3);
        assert_eq!(serde_json::to_value(MetricValue::Double(1.5)).unwrap(), 1.5);

        let stats = MetricValue::Stats(StatisticSet {
            count: 4,
            sum: 10.0,
            min: 1.0,
            max: 4.0,
        });
        assert_eq!(
            serde_json::to_value(stats).unwrap(),
            serde_json::json!({"Count": 4, "Sum": 10.0, "Min": 1.0, "Max": 4.0})
        );
    }

    #[test]
    fn test_tracing_warn_sink_accepts_any_fields() {
        let sink = TracingWarnSink;
        sink.warn(
            "Duplicate metric found",
            &[
                (FIELD_NAME, "requests".to_string()),
                (FIELD_LABELS, r#"{"host": "a"}"#.to_string()),
            ],
        );
        sink.warn("Unexpected point", &[("Reason", "overflow".to_string())]);
        sink.warn("No fields", &[]);
    }

    #[test]
    fn test_descriptor_lookup_hashmap() {
        let mut descriptors = HashMap::new();
        descriptors.insert(
            "latency".to_string(),
            MetricDescriptor {
                metric_name: "latency".to_string(),
                unit: "Milliseconds".to_string(),
                overwrite: false,
            },
        );

        assert_eq!(descriptors.lookup("latency").unwrap().unit, "Milliseconds");
        assert!(descriptors.lookup("other").is_none());
    }
}
